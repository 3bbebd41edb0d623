// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Execute one catalog Query against Evergreen and classify envelope-level failures
// role: upstream/gateway
// inputs: Query, Credentials; endpoint + timeout from AdapterConfig; optional fixtures directory
// outputs: The `data.<root_field>` subtree of a successful reply
// side_effects: One HTTP POST per execute (HttpGraphqlApi); file reads (FixtureGraphqlApi)
// invariants:
// - Exactly one request, no retry, no pagination
// - Any GraphQL `errors` entry fails the call; partial data is never returned
// - Business content is not inspected beyond the envelope and the root field
// errors: extensions.code first, message hints only without codes; Authentication (401/403, auth), NotFound (null root / not found), SchemaMismatch (shape), UpstreamUnavailable (transport, 5xx, other errors)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AdapterConfig, Credentials};
use crate::error::{AdapterError, AdapterResult};
use crate::ext::serde_json::JsonFetch;
use crate::upstream::catalog::Query;

// --- Trait seam for the GraphQL endpoint ---
pub trait GraphqlApi: Send + Sync {
  /// Run `query` and return the value at `data.<query.root_field>`.
  fn execute(&self, query: &Query, credentials: &Credentials) -> AdapterResult<Value>;
}

/// Pick the live HTTP client, or the fixture reader when a fixtures directory is configured.
pub fn api_from_config(cfg: &AdapterConfig) -> Box<dyn GraphqlApi> {
  match &cfg.fixtures_dir {
    Some(dir) => Box::new(FixtureGraphqlApi::new(dir.clone())),
    None => Box::new(HttpGraphqlApi::new(&cfg.graphql_endpoint, cfg.timeout)),
  }
}

fn not_found_or(query: &Query, fallback: AdapterError) -> AdapterError {
  match &query.subject {
    Some(s) => AdapterError::not_found(s.kind, &s.id),
    None => fallback,
  }
}

/// Map `extensions.code` values; they take precedence over any message text.
fn classify_codes(query: &Query, codes: &[String], joined: String) -> AdapterError {
  let has_code = |c: &str| codes.iter().any(|x| x == c);

  if has_code("UNAUTHENTICATED") || has_code("FORBIDDEN") {
    AdapterError::Authentication(joined)
  } else if has_code("RESOURCE_NOT_FOUND") {
    not_found_or(query, AdapterError::UpstreamUnavailable(joined))
  } else if codes.iter().any(|c| c.starts_with("GRAPHQL_")) {
    AdapterError::SchemaMismatch(joined)
  } else {
    AdapterError::UpstreamUnavailable(joined)
  }
}

/// Classify a parsed reply body. Pure; shared by every GraphqlApi implementation.
pub fn interpret_envelope(query: &Query, body: &Value) -> AdapterResult<Value> {
  if !body.is_object() {
    return Err(AdapterError::SchemaMismatch(format!(
      "{}: reply is not a JSON object",
      query.operation
    )));
  }

  if let Some(errors) = body.fetch("errors").as_array().filter(|e| !e.is_empty()) {
    let messages: Vec<String> = errors
      .iter()
      .map(|e| e.fetch("message").to::<String>().unwrap_or_else(|| e.to_string()))
      .collect();
    let codes: Vec<String> = errors
      .iter()
      .filter_map(|e| e.fetch("extensions.code").to::<String>())
      .map(|c| c.to_ascii_uppercase())
      .collect();
    let joined = messages.join("; ");

    if !codes.is_empty() {
      return Err(classify_codes(query, &codes, joined));
    }

    // No codes: the message text is all there is. The subject id is blanked first
    // since upstream messages quote it and an id may contain any of the hint words.
    let mut lower = joined.to_ascii_lowercase();
    if let Some(s) = query.subject.as_ref().filter(|s| !s.id.is_empty()) {
      lower = lower.replace(&s.id.to_ascii_lowercase(), "<id>");
    }

    if lower.contains("unauthorized") || lower.contains("unauthenticated") || lower.contains("not authenticated") {
      return Err(AdapterError::Authentication(joined));
    }

    if lower.contains("cannot query field") || lower.contains("unknown argument") || lower.contains("unknown type") {
      return Err(AdapterError::SchemaMismatch(joined));
    }

    if lower.contains("not found") || lower.contains("not exist") {
      return Err(not_found_or(query, AdapterError::UpstreamUnavailable(joined)));
    }

    return Err(AdapterError::UpstreamUnavailable(joined));
  }

  let data = body.fetch("data");
  if !data.is_present() {
    return Err(AdapterError::SchemaMismatch(format!("{}: reply has no data", query.operation)));
  }

  match data.value().and_then(|d| d.get(query.root_field)) {
    None => Err(AdapterError::SchemaMismatch(format!(
      "{}: data.{} is missing",
      query.operation, query.root_field
    ))),
    Some(Value::Null) => Err(not_found_or(
      query,
      AdapterError::SchemaMismatch(format!("{}: data.{} is null", query.operation, query.root_field)),
    )),
    Some(root) => Ok(root.clone()),
  }
}

/// Map a non-2xx HTTP status. 400/422 bodies usually carry GraphQL errors worth reading.
fn interpret_status(query: &Query, code: u16, body: Option<Value>) -> AdapterError {
  match code {
    401 | 403 => AdapterError::Authentication(format!("Evergreen rejected the credentials (HTTP {})", code)),
    400 | 422 => match body.as_ref().map(|b| interpret_envelope(query, b)) {
      Some(Err(e)) => e,
      _ => AdapterError::SchemaMismatch(format!("{}: HTTP {} without GraphQL errors", query.operation, code)),
    },
    _ => AdapterError::UpstreamUnavailable(format!("{}: HTTP {}", query.operation, code)),
  }
}

pub struct HttpGraphqlApi {
  agent: ureq::Agent,
  endpoint: String,
}

impl HttpGraphqlApi {
  pub fn new(endpoint: &str, timeout: Duration) -> Self {
    let agent = ureq::AgentBuilder::new()
      .timeout(timeout)
      .user_agent(concat!("evergreen-mcp/", env!("CARGO_PKG_VERSION")))
      .build();

    Self {
      agent,
      endpoint: endpoint.to_string(),
    }
  }
}

impl GraphqlApi for HttpGraphqlApi {
  fn execute(&self, query: &Query, credentials: &Credentials) -> AdapterResult<Value> {
    debug!(operation = query.operation, endpoint = %self.endpoint, "graphql request");

    let mut req = self
      .agent
      .post(&self.endpoint)
      .set("Accept", "application/json");
    for (name, value) in credentials.headers() {
      req = req.set(name, &value);
    }

    let result = match req.send_json(query.body()) {
      Ok(resp) => match resp.into_json::<Value>() {
        Ok(body) => interpret_envelope(query, &body),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(AdapterError::SchemaMismatch(format!(
          "{}: reply body is not JSON: {}",
          query.operation, e
        ))),
        Err(e) => Err(AdapterError::UpstreamUnavailable(format!(
          "{}: reading reply: {}",
          query.operation, e
        ))),
      },
      Err(ureq::Error::Status(code, resp)) => Err(interpret_status(query, code, resp.into_json::<Value>().ok())),
      Err(ureq::Error::Transport(t)) => Err(AdapterError::UpstreamUnavailable(format!(
        "{}: {}",
        query.operation, t
      ))),
    };

    if let Err(e) = &result {
      warn!(operation = query.operation, kind = e.kind(), "graphql request failed: {}", e);
    }

    result
  }
}

/// Serves canned reply envelopes from `<dir>/<operation>.json`.
///
/// A subject-specific file `<dir>/<operation>__<id>.json` wins when present, so one
/// directory can hold both a found and a not-found reply for the same operation.
pub struct FixtureGraphqlApi {
  dir: PathBuf,
}

impl FixtureGraphqlApi {
  pub fn new(dir: PathBuf) -> Self {
    Self { dir }
  }

  fn fixture_path(&self, query: &Query) -> PathBuf {
    if let Some(s) = query.subject.as_ref().filter(|s| is_plain_file_stem(&s.id)) {
      let specific = self.dir.join(format!("{}__{}.json", query.operation, s.id));
      if specific.exists() {
        return specific;
      }
    }
    self.dir.join(format!("{}.json", query.operation))
  }
}

/// Ids only pick a subject file when they cannot leave the fixtures directory.
fn is_plain_file_stem(id: &str) -> bool {
  !id.is_empty() && !id.contains("..") && !id.chars().any(|c| matches!(c, '/' | '\\' | '\0'))
}

impl GraphqlApi for FixtureGraphqlApi {
  fn execute(&self, query: &Query, _credentials: &Credentials) -> AdapterResult<Value> {
    let path = self.fixture_path(query);
    debug!(operation = query.operation, fixture = %path.display(), "fixture request");

    let text = std::fs::read_to_string(&path)
      .map_err(|e| AdapterError::UpstreamUnavailable(format!("fixture {}: {}", path.display(), e)))?;
    let body: Value = serde_json::from_str(&text)
      .map_err(|e| AdapterError::SchemaMismatch(format!("fixture {}: {}", path.display(), e)))?;

    interpret_envelope(query, &body)
  }
}
