// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Command-line surface: config overrides, logging switches, and hidden test/packaging flags
// role: cli/parsing
// outputs: Cli (clap derive) and its conversion into ConfigOverrides + LogSettings
// invariants: Flags only override; anything not given falls through to env and the config file
// errors: normalize() rejects a malformed --now-override
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;

use crate::config::ConfigOverrides;
use crate::util;

#[derive(Parser, Debug)]
#[command(
    name = "evergreen-mcp",
    version,
    about = "Serve Evergreen CI patches, failed tasks, tests and logs as MCP tools over stdio",
    long_about = None
)]
pub struct Cli {
  /// Path to the Evergreen config file (default: ~/.evergreen.yml)
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Project identifier bound to this process (overrides workspace detection)
  #[arg(long = "project-id")]
  pub project_id: Option<String>,

  /// Workspace directory used for project auto-detection (default: current dir)
  #[arg(long = "workspace-dir")]
  pub workspace_dir: Option<PathBuf>,

  /// GraphQL endpoint (default: <ui-url>/graphql/query)
  #[arg(long = "graphql-url")]
  pub graphql_url: Option<String>,

  /// Evergreen UI base URL used for log and task links
  #[arg(long = "ui-url")]
  pub ui_url: Option<String>,

  /// Transport timeout for one upstream request, in seconds
  #[arg(long = "timeout-secs")]
  pub timeout_secs: Option<u64>,

  /// Default log filter when RUST_LOG is unset (logs go to stderr)
  #[arg(long = "log-level", default_value = "info")]
  pub log_level: String,

  /// Emit logs as JSON lines
  #[arg(long = "log-json")]
  pub log_json: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Pin the clock used for response metadata (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
  pub level: String,
  pub json: bool,
}

#[derive(Debug)]
pub struct Normalized {
  pub overrides: ConfigOverrides,
  pub log: LogSettings,
  pub now: Option<DateTime<Utc>>,
}

pub fn normalize(cli: Cli) -> Result<Normalized> {
  let now = cli.now_override.as_deref().map(util::parse_now_override).transpose()?;

  Ok(Normalized {
    overrides: ConfigOverrides {
      config_path: cli.config,
      project_id: cli.project_id,
      workspace_dir: cli.workspace_dir,
      graphql_url: cli.graphql_url,
      ui_url: cli.ui_url,
      timeout_secs: cli.timeout_secs,
    },
    log: LogSettings {
      level: cli.log_level,
      json: cli.log_json,
    },
    now,
  })
}
