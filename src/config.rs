// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Build the immutable AdapterConfig once at start-up from CLI flags, environment, and ~/.evergreen.yml
// role: configuration/loading
// inputs: ConfigOverrides (from clap), process env (EVERGREEN_*, WORKSPACE_PATH), optional YAML file
// outputs: AdapterConfig and a CredentialProvider; both read-only after construction
// side_effects: Reads the config file and process environment in load(); build() is pure
// invariants:
// - Precedence is CLI > env > file > built-in default for every setting
// - ui_base and graphql_endpoint are validated http(s) URLs without trailing slash
// - directory mappings are absolute with ~ expanded
// - Credentials never appear in Debug output or logs
// errors: Configuration for malformed hosts; Authentication when credentials are requested but absent
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{AdapterError, AdapterResult};
use crate::util;

pub const DEFAULT_UI_BASE: &str = "https://evergreen.mongodb.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONFIG_FILE: &str = ".evergreen.yml";

static RE_BASE_URL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^https?://[A-Za-z0-9.\-]+(:[0-9]{1,5})?(/[^\s?#]*)?$").unwrap());

/// Settings supplied on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
  pub config_path: Option<PathBuf>,
  pub project_id: Option<String>,
  pub workspace_dir: Option<PathBuf>,
  pub graphql_url: Option<String>,
  pub ui_url: Option<String>,
  pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FileProject {
  pub name: String,
  #[serde(default)]
  pub default: bool,
}

/// The subset of `~/.evergreen.yml` this adapter reads. Unknown keys are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FileConfig {
  #[serde(default)]
  pub user: Option<String>,
  #[serde(default)]
  pub api_key: Option<String>,
  #[serde(default)]
  pub api_server_host: Option<String>,
  #[serde(default)]
  pub ui_server_host: Option<String>,
  #[serde(default)]
  pub projects: Vec<FileProject>,
  #[serde(default)]
  pub projects_for_directory: BTreeMap<String, String>,
}

impl FileConfig {
  pub fn parse(text: &str) -> Result<Self> {
    if text.trim().is_empty() {
      return Ok(Self::default());
    }
    let cfg: FileConfig = serde_yaml::from_str(text).context("parsing evergreen config YAML")?;
    Ok(cfg)
  }
}

#[derive(Clone)]
pub struct AdapterConfig {
  pub user_id: Option<String>,
  pub api_key: Option<String>,
  pub bearer_token: Option<String>,
  pub graphql_endpoint: String,
  pub ui_base: String,
  /// Project bound to the whole process (`--project-id` or `EVERGREEN_PROJECT`).
  pub project_override: Option<String>,
  pub workspace_dir: PathBuf,
  /// Directory to project mappings, absolute paths.
  pub directory_projects: Vec<(PathBuf, String)>,
  /// Statically configured project identifiers; `default: true` entries come first.
  pub static_projects: Vec<String>,
  pub timeout: Duration,
  /// When set, the gateway serves canned envelopes from this directory instead of HTTP.
  pub fixtures_dir: Option<PathBuf>,
}

impl fmt::Debug for AdapterConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AdapterConfig")
      .field("user_id", &self.user_id)
      .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
      .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
      .field("graphql_endpoint", &self.graphql_endpoint)
      .field("ui_base", &self.ui_base)
      .field("project_override", &self.project_override)
      .field("workspace_dir", &self.workspace_dir)
      .field("directory_projects", &self.directory_projects)
      .field("static_projects", &self.static_projects)
      .field("timeout", &self.timeout)
      .field("fixtures_dir", &self.fixtures_dir)
      .finish()
  }
}

fn non_empty(v: Option<String>) -> Option<String> {
  v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Validate an http(s) base URL and strip any trailing slash.
pub fn validate_base_url(setting: &str, raw: &str) -> AdapterResult<String> {
  let trimmed = raw.trim().trim_end_matches('/');
  if RE_BASE_URL.is_match(trimmed) {
    Ok(trimmed.to_string())
  } else {
    Err(AdapterError::Configuration(format!(
      "{} must be an http(s) URL like https://host[:port][/path], got {:?}",
      setting, raw
    )))
  }
}

/// GraphQL endpoint derived from the REST `api_server_host` (`https://host/api` -> `https://host/graphql/query`).
fn endpoint_from_api_host(api_host: &str) -> String {
  let base = api_host.trim().trim_end_matches('/');
  let base = base.strip_suffix("/api").unwrap_or(base);
  format!("{}/graphql/query", base)
}

impl AdapterConfig {
  /// Load from the process environment and the config file.
  pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
    let home = util::home_dir();
    let file = read_config_file(overrides.config_path.as_deref(), home.as_deref())?;
    let cfg = Self::build(overrides, |k| std::env::var(k).ok(), file, home.as_deref())?;
    Ok(cfg)
  }

  /// Merge the three sources. `env` looks up one variable by name.
  pub fn build<F>(overrides: &ConfigOverrides, env: F, file: FileConfig, home: Option<&Path>) -> AdapterResult<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let env = |k: &str| non_empty(env(k));

    let ui_raw = non_empty(overrides.ui_url.clone())
      .or_else(|| env("EVERGREEN_UI_URL"))
      .or_else(|| non_empty(file.ui_server_host.clone()))
      .unwrap_or_else(|| DEFAULT_UI_BASE.to_string());
    let ui_base = validate_base_url("ui base host", &ui_raw)?;

    let graphql_raw = non_empty(overrides.graphql_url.clone())
      .or_else(|| env("EVERGREEN_GRAPHQL_URL"))
      .or_else(|| non_empty(file.api_server_host.clone()).map(|h| endpoint_from_api_host(&h)))
      .unwrap_or_else(|| format!("{}/graphql/query", ui_base));
    let graphql_endpoint = validate_base_url("graphql endpoint", &graphql_raw)?;

    let workspace_raw = overrides
      .workspace_dir
      .clone()
      .or_else(|| env("WORKSPACE_PATH").map(|p| util::expand_tilde(&p, home)))
      .unwrap_or_else(|| PathBuf::from("."));

    let directory_projects = file
      .projects_for_directory
      .iter()
      .filter(|(dir, project)| !dir.trim().is_empty() && !project.trim().is_empty())
      .map(|(dir, project)| {
        (
          util::canonicalize_lossy(util::expand_tilde(dir.trim(), home)),
          project.trim().to_string(),
        )
      })
      .collect();

    let mut named: Vec<&FileProject> = file.projects.iter().filter(|p| !p.name.trim().is_empty()).collect();
    named.sort_by_key(|p| !p.default);
    let mut static_projects: Vec<String> = Vec::new();
    for p in named {
      let name = p.name.trim().to_string();
      if !static_projects.contains(&name) {
        static_projects.push(name);
      }
    }

    Ok(Self {
      user_id: env("EVERGREEN_USER").or_else(|| non_empty(file.user.clone())),
      api_key: env("EVERGREEN_API_KEY").or_else(|| non_empty(file.api_key.clone())),
      bearer_token: env("EVERGREEN_TOKEN"),
      graphql_endpoint,
      ui_base,
      project_override: non_empty(overrides.project_id.clone()).or_else(|| env("EVERGREEN_PROJECT")),
      workspace_dir: util::canonicalize_lossy(workspace_raw),
      directory_projects,
      static_projects,
      timeout: Duration::from_secs(overrides.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1)),
      fixtures_dir: env("EVERGREEN_MCP_FIXTURES").map(PathBuf::from),
    })
  }

  pub fn credential_provider(&self) -> StaticCredentials {
    StaticCredentials {
      user: self.user_id.clone(),
      api_key: self.api_key.clone(),
      token: self.bearer_token.clone(),
    }
  }
}

/// Read the YAML file. An explicit path must exist; the default path may be absent.
fn read_config_file(explicit: Option<&Path>, home: Option<&Path>) -> Result<FileConfig> {
  let (path, required) = match (explicit, home) {
    (Some(p), _) => (p.to_path_buf(), true),
    (None, Some(h)) => (h.join(DEFAULT_CONFIG_FILE), false),
    (None, None) => return Ok(FileConfig::default()),
  };

  if !required && !path.exists() {
    return Ok(FileConfig::default());
  }

  let text = std::fs::read_to_string(&path).with_context(|| format!("reading config file {}", path.display()))?;
  FileConfig::parse(&text).with_context(|| format!("in {}", path.display()))
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq)]
pub enum Credentials {
  ApiKey { user: String, key: String },
  Bearer { user: String, token: String },
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Credentials::ApiKey { user, .. } => write!(f, "ApiKey {{ user: {:?}, key: <redacted> }}", user),
      Credentials::Bearer { user, .. } => write!(f, "Bearer {{ user: {:?}, token: <redacted> }}", user),
    }
  }
}

impl Credentials {
  pub fn user(&self) -> &str {
    match self {
      Credentials::ApiKey { user, .. } | Credentials::Bearer { user, .. } => user,
    }
  }

  /// HTTP headers that authenticate a GraphQL request.
  pub fn headers(&self) -> Vec<(&'static str, String)> {
    match self {
      Credentials::ApiKey { user, key } => vec![("Api-User", user.clone()), ("Api-Key", key.clone())],
      Credentials::Bearer { token, .. } => vec![("Authorization", format!("Bearer {}", token))],
    }
  }
}

pub trait CredentialProvider: Send + Sync {
  fn credentials(&self) -> AdapterResult<Credentials>;
}

/// Credentials fixed at start-up. A bearer token wins over an API key.
#[derive(Clone, Default)]
pub struct StaticCredentials {
  pub user: Option<String>,
  pub api_key: Option<String>,
  pub token: Option<String>,
}

impl CredentialProvider for StaticCredentials {
  fn credentials(&self) -> AdapterResult<Credentials> {
    let Some(user) = self.user.clone() else {
      return Err(AdapterError::Authentication(
        "no Evergreen user configured (set EVERGREEN_USER or `user` in ~/.evergreen.yml)".into(),
      ));
    };

    if let Some(token) = self.token.clone() {
      return Ok(Credentials::Bearer { user, token });
    }
    if let Some(key) = self.api_key.clone() {
      return Ok(Credentials::ApiKey { user, key });
    }

    Err(AdapterError::Authentication(
      "no Evergreen API key or token configured (set EVERGREEN_API_KEY or `api_key` in ~/.evergreen.yml)".into(),
    ))
  }
}
