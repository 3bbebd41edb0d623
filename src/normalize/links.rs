// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Build log and task-page URLs from the configured UI base host
// role: normalize/links
// inputs: ui base host (validated), task id, execution
// outputs: LogLinks for task/agent/system/all logs plus the task page
// invariants: A LinkBuilder only exists for a valid base, so every URL it emits is well formed
// errors: Configuration when the base host is malformed
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::config::validate_base_url;
use crate::error::AdapterResult;
use crate::model::LogLinks;

/// Raw log endpoint `type` codes, keyed by log kind.
const LOG_TYPES: [(&str, &str); 4] = [("task", "T"), ("agent", "E"), ("system", "S"), ("all", "ALL")];

/// Log kind for a raw `type` code (`E` is `agent`); unknown codes are lowercased.
pub fn log_kind(code: &str) -> String {
  let code = code.trim();
  LOG_TYPES
    .iter()
    .find(|(_, c)| c.eq_ignore_ascii_case(code))
    .map(|(kind, _)| kind.to_string())
    .unwrap_or_else(|| code.to_ascii_lowercase())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkBuilder {
  base: String,
}

impl LinkBuilder {
  pub fn new(ui_base: &str) -> AdapterResult<Self> {
    Ok(Self {
      base: validate_base_url("ui base host", ui_base)?,
    })
  }

  fn raw_log(&self, task_id: &str, execution: i64, code: &str) -> String {
    format!(
      "{}/task_log_raw/{}/{}?type={}&text=true",
      self.base,
      encode_segment(task_id),
      execution,
      code
    )
  }

  pub fn log_url(&self, kind: &str, task_id: &str, execution: i64) -> Option<String> {
    LOG_TYPES
      .iter()
      .find(|(k, _)| *k == kind)
      .map(|(_, code)| self.raw_log(task_id, execution, code))
  }

  fn log_url_or_all(&self, kind: &str, task_id: &str, execution: i64) -> String {
    self
      .log_url(kind, task_id, execution)
      .unwrap_or_else(|| self.raw_log(task_id, execution, "ALL"))
  }

  pub fn task_page(&self, task_id: &str, execution: i64) -> String {
    format!("{}/task/{}/{}", self.base, encode_segment(task_id), execution)
  }

  pub fn task_links(&self, task_id: &str, execution: i64) -> LogLinks {
    LogLinks {
      task_log: self.log_url_or_all("task", task_id, execution),
      agent_log: self.log_url_or_all("agent", task_id, execution),
      system_log: self.log_url_or_all("system", task_id, execution),
      all_logs: self.log_url_or_all("all", task_id, execution),
      task_page: self.task_page(task_id, execution),
    }
  }
}

/// Percent-encode everything outside the unreserved URL set.
fn encode_segment(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for b in raw.bytes() {
    match b {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
      _ => out.push_str(&format!("%{:02X}", b)),
    }
  }
  out
}
