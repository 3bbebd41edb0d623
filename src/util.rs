// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, canonical timestamps, the injectable clock, and man page rendering
// role: utilities/helpers
// inputs: Various primitives; upstream timestamp strings; paths; clap CommandFactory
// outputs: Absolute paths, RFC3339 UTC timestamps, clock instants, man page text
// side_effects: canonicalize_lossy stats the filesystem
// invariants:
// - canonical_timestamp always emits second precision with an explicit +00:00 offset
// - FixedClock never drifts; SystemClock reads wall time on every call
// errors: parse_now_override surfaces the rejected input; render_man_page bubbles IO errors
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use clap::CommandFactory;

/// Absolute form of `p`. Falls back to joining onto the current directory when the path
/// does not exist (the mapping may name a checkout that is not present on this machine).
pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> PathBuf {
  let p = p.as_ref();
  match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) if p.is_absolute() => p.to_path_buf(),
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => p.to_path_buf(),
    },
  }
}

/// Expand a leading `~` or `~/` against `home`. Other paths pass through unchanged.
pub fn expand_tilde(raw: &str, home: Option<&Path>) -> PathBuf {
  match (raw, home) {
    ("~", Some(h)) => h.to_path_buf(),
    (r, Some(h)) if r.starts_with("~/") => h.join(&r[2..]),
    (r, _) => PathBuf::from(r),
  }
}

pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("HOME").filter(|h| !h.is_empty()).map(PathBuf::from)
}

/// Render an instant in the one timestamp format every tool output uses.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Normalize an upstream timestamp to RFC3339 in UTC.
///
/// Accepts RFC3339 with any offset, or a naive `YYYY-MM-DD[T ]HH:MM:SS[.fff]` which is taken
/// as UTC. Returns `None` for anything else; callers decide whether that is a schema problem.
pub fn canonical_timestamp(raw: &str) -> Option<String> {
  let raw = raw.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(format_timestamp(dt.with_timezone(&Utc)));
  }

  ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| format_timestamp(naive.and_utc()))
}

/// Source of "now" for response metadata.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}

/// Parse the hidden `--now-override` value (RFC3339).
pub fn parse_now_override(raw: &str) -> Result<DateTime<Utc>> {
  let dt = DateTime::parse_from_rfc3339(raw.trim())
    .with_context(|| format!("--now-override expects RFC3339, got {:?}", raw))?;
  Ok(dt.with_timezone(&Utc))
}

/// Clock to use given an optional override instant.
pub fn effective_clock(override_now: Option<DateTime<Utc>>) -> Box<dyn Clock> {
  match override_now {
    Some(dt) => Box::new(FixedClock(dt)),
    None => Box::new(SystemClock),
  }
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
