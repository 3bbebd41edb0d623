// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Shape task log lines: canonical severities, optional error filter, head truncation
// role: normalize/logs
// inputs: `task` subtree with taskLogs.taskLogs[*] {severity, message, timestamp, type}
// outputs: {task_id, execution, task_name, log_type, host, links, logs, total_lines, returned_lines, unfiltered_lines, filter_applied, truncated}
// invariants:
// - Lines keep upstream order; truncation drops the tail
// - filter_errors keeps only error/fatal lines; an empty result stays empty (no widening)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde_json::{json, Value};

use crate::error::{AdapterError, AdapterResult};
use crate::model::{parse_fragment, LogLine, RawLogLine, RawTask};
use crate::normalize::failed_tasks::host_info;
use crate::normalize::links::log_kind;
use crate::normalize::{timestamp, truncate, NormalizeCtx, OutputShape};
use crate::upstream::catalog::Bounded;

const ERROR_SEVERITIES: [&str; 2] = ["error", "fatal"];

/// Map the upstream's one-letter level codes to words; other values are lowercased as-is.
pub fn canonical_severity(raw: Option<&str>) -> String {
  let s = raw.unwrap_or("").trim().to_ascii_lowercase();
  let word = match s.as_str() {
    "e" => "error",
    "w" => "warning",
    "i" => "info",
    "d" => "debug",
    "f" => "fatal",
    "t" => "trace",
    "" => "unknown",
    other => other,
  };
  word.to_string()
}

pub fn is_error_severity(severity: &str) -> bool {
  ERROR_SEVERITIES.iter().any(|s| s.eq_ignore_ascii_case(severity))
}

fn line(raw: RawLogLine) -> AdapterResult<LogLine> {
  Ok(LogLine {
    severity: canonical_severity(raw.severity.as_deref()),
    message: raw.message.unwrap_or_default(),
    timestamp: timestamp("log.timestamp", raw.timestamp.as_deref())?,
    kind: raw.kind.as_deref().map(log_kind),
  })
}

pub struct LogListing {
  pub max_lines: Bounded,
  pub filter_errors: bool,
}

impl OutputShape for LogListing {
  fn normalize(&self, root: &Value, ctx: &NormalizeCtx<'_>) -> AdapterResult<Value> {
    let mut task: RawTask = parse_fragment("task", root)?;
    let Some(logs) = task.task_logs.take() else {
      return Err(AdapterError::SchemaMismatch("task: `taskLogs` is missing".into()));
    };

    let all = logs.task_logs.into_iter().map(line).collect::<AdapterResult<Vec<_>>>()?;
    let unfiltered = all.len();
    let kept: Vec<LogLine> = if self.filter_errors {
      all.into_iter().filter(|l| is_error_severity(&l.severity)).collect()
    } else {
      all
    };
    let t = truncate(kept, self.max_lines.effective as usize);
    let execution = task.execution.unwrap_or(0);

    Ok(json!({
      "task_id": task.id,
      "execution": execution,
      "task_name": task.display_name,
      "build_variant": task.build_variant,
      "status": task.status,
      "log_type": "task",
      "host": host_info(&task),
      "links": ctx.links.task_links(&task.id, execution),
      "logs": t.items,
      "total_lines": t.total,
      "returned_lines": t.items.len(),
      "unfiltered_lines": unfiltered,
      "filter_applied": if self.filter_errors { "error and fatal only" } else { "none" },
      "truncated": t.truncated,
    }))
  }

  fn limit(&self) -> Option<Bounded> {
    Some(self.max_lines)
  }
}
