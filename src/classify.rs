// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Bucket a failed task into exactly one failure class and attach a next-step recommendation
// role: classification/rules
// inputs: task status, failure_details.timed_out, test_info.failed_test_count
// outputs: FailureClass (kebab-case on the wire) and a recommendation string
// invariants:
// - Pure and deterministic; first matching rule wins so buckets are mutually exclusive
// - Infrastructure rules (system, setup) run before the test-count rule
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureClass {
  TestFailure,
  Timeout,
  SystemFailure,
  SetupFailure,
  UnknownFailure,
}

impl FailureClass {
  pub const ALL: [FailureClass; 5] = [
    FailureClass::TestFailure,
    FailureClass::Timeout,
    FailureClass::SystemFailure,
    FailureClass::SetupFailure,
    FailureClass::UnknownFailure,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      FailureClass::TestFailure => "test-failure",
      FailureClass::Timeout => "timeout",
      FailureClass::SystemFailure => "system-failure",
      FailureClass::SetupFailure => "setup-failure",
      FailureClass::UnknownFailure => "unknown-failure",
    }
  }

  pub fn recommendation(self) -> &'static str {
    match self {
      FailureClass::SystemFailure => "Infrastructure failure, not a code issue; restart the task.",
      FailureClass::SetupFailure => "Environment or setup problem; check the setup commands and project config.",
      FailureClass::Timeout => "Task timed out; look for a hang or performance regression in the logs.",
      FailureClass::TestFailure => "Tests failed; inspect them with get-task-tests.",
      FailureClass::UnknownFailure => "No clear signal; read the raw output with get-task-logs.",
    }
  }
}

/// Fields the rules look at.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput<'a> {
  pub status: &'a str,
  pub timed_out: bool,
  pub failed_test_count: u64,
}

pub fn classify(input: ClassifyInput<'_>) -> FailureClass {
  let status = input.status.trim().to_ascii_lowercase();

  if matches!(status.as_str(), "system-failed" | "system-timed-out") {
    return FailureClass::SystemFailure;
  }
  if status == "setup-failed" {
    return FailureClass::SetupFailure;
  }
  if input.timed_out || matches!(status.as_str(), "timed-out" | "test-timed-out" | "task-timed-out") {
    return FailureClass::Timeout;
  }
  if input.failed_test_count > 0 {
    return FailureClass::TestFailure;
  }
  FailureClass::UnknownFailure
}
