use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use evergreen_mcp::cli::{normalize, Cli, LogSettings};
use evergreen_mcp::config::AdapterConfig;
use evergreen_mcp::server::McpServer;
use evergreen_mcp::tools::ToolContext;
use evergreen_mcp::upstream::api_from_config;
use evergreen_mcp::util;

/// stdout carries the protocol, so every log line goes to stderr.
fn init_tracing(log: &LogSettings) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false);

  let _ = if log.json {
    builder.json().try_init()
  } else {
    builder.try_init()
  };
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  // Phase 1: normalize CLI and start logging
  let args = normalize(cli)?;
  init_tracing(&args.log);

  // Phase 2: build the immutable configuration and the tool context
  let cfg = AdapterConfig::load(&args.overrides).context("loading Evergreen configuration")?;
  tracing::info!(
    endpoint = %cfg.graphql_endpoint,
    ui = %cfg.ui_base,
    fixtures = cfg.fixtures_dir.is_some(),
    "configuration loaded"
  );

  let api = api_from_config(&cfg);
  let credentials = Box::new(cfg.credential_provider());
  let ctx = ToolContext::new(cfg, api, credentials, util::effective_clock(args.now))?;

  // Phase 3: serve until stdin closes
  let stdin = std::io::stdin();
  let stdout = std::io::stdout();
  McpServer::new(ctx).serve(stdin.lock(), stdout.lock())
}
