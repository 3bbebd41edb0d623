// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed failure taxonomy shared by every pipeline stage and the JSON error envelope tools return
// role: errors/taxonomy
// outputs: AdapterError with machine-readable kind, implicated parameter/identifier and a recovery suggestion
// invariants:
// - kind() strings are stable; clients match on them
// - Display is a single line; credentials never appear in messages
// errors: n/a (this module defines them)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde_json::{json, Value};

pub type AdapterResult<T> = Result<T, AdapterError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
  #[error("authentication failed: {0}")]
  Authentication(String),

  #[error("no project could be resolved for this call")]
  ProjectNotResolved,

  #[error("invalid argument '{parameter}': {constraint}")]
  InvalidArgument { parameter: String, constraint: String },

  #[error("{kind} '{id}' was not found upstream")]
  NotFound { kind: String, id: String },

  #[error("upstream unavailable: {0}")]
  UpstreamUnavailable(String),

  #[error("unexpected upstream response shape: {0}")]
  SchemaMismatch(String),

  #[error("configuration error: {0}")]
  Configuration(String),

  #[error("unknown tool '{0}'")]
  UnknownTool(String),
}

impl AdapterError {
  pub fn invalid_argument(parameter: &str, constraint: impl Into<String>) -> Self {
    AdapterError::InvalidArgument {
      parameter: parameter.to_string(),
      constraint: constraint.into(),
    }
  }

  pub fn not_found(kind: &str, id: &str) -> Self {
    AdapterError::NotFound {
      kind: kind.to_string(),
      id: id.to_string(),
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      AdapterError::Authentication(_) => "authentication",
      AdapterError::ProjectNotResolved => "project_not_resolved",
      AdapterError::InvalidArgument { .. } => "invalid_argument",
      AdapterError::NotFound { .. } => "not_found",
      AdapterError::UpstreamUnavailable(_) => "upstream_unavailable",
      AdapterError::SchemaMismatch(_) => "schema_mismatch",
      AdapterError::Configuration(_) => "configuration",
      AdapterError::UnknownTool(_) => "unknown_tool",
    }
  }

  pub fn parameter(&self) -> Option<&str> {
    match self {
      AdapterError::InvalidArgument { parameter, .. } => Some(parameter),
      _ => None,
    }
  }

  pub fn identifier(&self) -> Option<&str> {
    match self {
      AdapterError::NotFound { id, .. } => Some(id),
      AdapterError::UnknownTool(name) => Some(name),
      _ => None,
    }
  }

  /// One-line hint telling the agent how to recover.
  pub fn suggestion(&self) -> &'static str {
    match self {
      AdapterError::Authentication(_) => {
        "Re-authenticate with Evergreen (refresh the API key or token), then retry the call."
      }
      AdapterError::ProjectNotResolved => {
        "Call discover-projects to list candidate projects, then pass project_id explicitly."
      }
      AdapterError::InvalidArgument { .. } => "Fix the named parameter and call the tool again.",
      AdapterError::NotFound { .. } => "Check the identifier; list-recent-patches and get-failed-jobs return valid ids.",
      AdapterError::UpstreamUnavailable(_) => "Evergreen could not be reached; retry the call later.",
      AdapterError::SchemaMismatch(_) => {
        "The Evergreen API changed shape; this adapter needs an update. Do not rely on partial data."
      }
      AdapterError::Configuration(_) => "Fix the adapter configuration (~/.evergreen.yml or flags) and restart.",
      AdapterError::UnknownTool(_) => "Call tools/list to see the available tools.",
    }
  }

  /// Upstream failures are worth retrying later; everything else needs the caller to change something.
  pub fn is_retryable(&self) -> bool {
    matches!(self, AdapterError::UpstreamUnavailable(_))
  }

  /// The JSON error envelope returned as a tool result.
  pub fn to_json(&self, tool: &str) -> Value {
    json!({
      "error": {
        "kind": self.kind(),
        "message": self.to_string(),
        "parameter": self.parameter(),
        "identifier": self.identifier(),
        "retryable": self.is_retryable(),
        "suggestion": self.suggestion(),
      },
      "tool": tool,
    })
  }
}
