// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed records for the Evergreen GraphQL fragments we read and the flat tool outputs we emit
// role: model/types
// inputs: GraphQL `data` subtrees (camelCase) via parse_fragment
// outputs: Raw* records (Deserialize) and output records (Serialize, snake_case field names)
// invariants:
// - A missing required upstream field fails the single parse step with SchemaMismatch; nothing is defaulted silently
// - Output field names are stable; optional fields serialize as null rather than disappearing
// - failed_test_count <= total_test_count in TestInfo
// errors: parse_fragment -> AdapterError::SchemaMismatch naming the fragment and serde's path
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::FailureClass;
use crate::error::{AdapterError, AdapterResult};

/// Parse one GraphQL fragment into its typed record.
pub fn parse_fragment<T: DeserializeOwned>(fragment: &str, value: &Value) -> AdapterResult<T> {
  serde_json::from_value::<T>(value.clone())
    .map_err(|e| AdapterError::SchemaMismatch(format!("{} fragment: {}", fragment, e)))
}

// ---------------------------------------------------------------------------
// Upstream fragments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawPatch {
  pub id: String,
  pub status: String,
  #[serde(default)]
  pub patch_number: Option<i64>,
  #[serde(default)]
  pub githash: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub author_display_name: Option<String>,
  #[serde(default)]
  pub create_time: Option<String>,
  #[serde(default)]
  pub project_identifier: Option<String>,
  #[serde(default)]
  pub version_full: Option<RawVersion>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawPatchPage {
  pub patches: Vec<RawPatch>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawVersion {
  pub id: String,
  pub status: String,
  #[serde(default)]
  pub revision: Option<String>,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub create_time: Option<String>,
  #[serde(default)]
  pub tasks: Option<RawTaskPage>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawTaskPage {
  #[serde(default)]
  pub count: Option<u64>,
  pub data: Vec<RawTask>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
  pub id: String,
  pub display_name: String,
  pub status: String,
  #[serde(default)]
  pub build_variant: Option<String>,
  #[serde(default)]
  pub execution: Option<i64>,
  #[serde(default)]
  pub finish_time: Option<String>,
  #[serde(default)]
  pub time_taken: Option<i64>,
  #[serde(default)]
  pub details: Option<RawTaskDetails>,
  #[serde(default)]
  pub ami: Option<String>,
  #[serde(default)]
  pub host_id: Option<String>,
  #[serde(default)]
  pub distro_id: Option<String>,
  #[serde(default)]
  pub image_id: Option<String>,
  #[serde(default)]
  pub tests: Option<RawTestPage>,
  #[serde(default)]
  pub task_logs: Option<RawTaskLogs>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawTaskDetails {
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub timed_out: Option<bool>,
  #[serde(default)]
  pub timeout_type: Option<String>,
  #[serde(default)]
  pub failing_command: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawTestPage {
  #[serde(default)]
  pub total_test_count: Option<u64>,
  #[serde(default)]
  pub filtered_test_count: Option<u64>,
  pub test_results: Vec<RawTestResult>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawTestResult {
  pub status: String,
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub test_file: Option<String>,
  #[serde(default)]
  pub duration: Option<f64>,
  #[serde(default)]
  pub start_time: Option<String>,
  #[serde(default)]
  pub end_time: Option<String>,
  #[serde(default)]
  pub exit_code: Option<i64>,
  #[serde(default, rename = "groupID")]
  pub group_id: Option<String>,
  #[serde(default)]
  pub logs: Option<RawTestLogs>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawTestLogs {
  #[serde(default)]
  pub url: Option<String>,
  #[serde(default)]
  pub url_parsley: Option<String>,
  #[serde(default)]
  pub url_raw: Option<String>,
  #[serde(default)]
  pub line_num: Option<i64>,
  #[serde(default)]
  pub rendering_type: Option<String>,
  #[serde(default)]
  pub version: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawTaskLogs {
  pub task_logs: Vec<RawLogLine>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawLogLine {
  #[serde(default)]
  pub severity: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub timestamp: Option<String>,
  #[serde(default, rename = "type")]
  pub kind: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawProjectGroup {
  #[serde(default)]
  pub group_display_name: Option<String>,
  pub projects: Vec<RawProject>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawProject {
  pub identifier: String,
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub display_name: Option<String>,
  #[serde(default)]
  pub enabled: Option<bool>,
  #[serde(default)]
  pub owner: Option<String>,
  #[serde(default)]
  pub repo: Option<String>,
  #[serde(default)]
  pub branch: Option<String>,
}

// ---------------------------------------------------------------------------
// Tool outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PatchSummary {
  pub patch_id: String,
  pub patch_number: Option<i64>,
  pub githash: Option<String>,
  pub description: Option<String>,
  pub author: Option<String>,
  pub author_display_name: Option<String>,
  pub status: String,
  pub create_time: Option<String>,
  pub project_identifier: Option<String>,
  pub has_version: bool,
  pub version_id: Option<String>,
  pub version_status: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct VersionInfo {
  pub version_id: String,
  pub status: String,
  pub revision: Option<String>,
  pub author: Option<String>,
  pub create_time: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct FailureDetails {
  pub description: Option<String>,
  pub timed_out: bool,
  pub timeout_type: Option<String>,
  pub failing_command: Option<String>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct TestInfo {
  pub has_test_results: bool,
  pub failed_test_count: u64,
  pub total_test_count: u64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct HostInfo {
  pub ami: Option<String>,
  pub host_id: Option<String>,
  pub distro_id: Option<String>,
  pub image_id: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LogLinks {
  pub task_log: String,
  pub agent_log: String,
  pub system_log: String,
  pub all_logs: String,
  pub task_page: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FailedTask {
  pub task_id: String,
  pub task_name: String,
  pub build_variant: Option<String>,
  pub version_id: String,
  pub status: String,
  pub execution: i64,
  pub finish_time: Option<String>,
  pub duration_ms: Option<i64>,
  pub failure_details: FailureDetails,
  pub test_info: TestInfo,
  pub host: HostInfo,
  pub logs: LogLinks,
  pub classification: FailureClass,
  pub recommendation: &'static str,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TestLogLinks {
  pub url: Option<String>,
  pub url_parsley: Option<String>,
  pub url_raw: Option<String>,
  pub line_num: Option<i64>,
  pub rendering_type: Option<String>,
  pub version: Option<i64>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TestRecord {
  pub test_id: Option<String>,
  pub test_file: Option<String>,
  pub status: String,
  pub duration: Option<f64>,
  pub start_time: Option<String>,
  pub end_time: Option<String>,
  pub exit_code: Option<i64>,
  pub group_id: Option<String>,
  pub logs: Option<TestLogLinks>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LogLine {
  pub severity: String,
  pub message: String,
  pub timestamp: Option<String>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProjectActivity {
  pub project_identifier: String,
  pub patch_count: u64,
  pub latest_patch_time: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProjectRecord {
  pub identifier: String,
  pub display_name: Option<String>,
  pub owner: Option<String>,
  pub repo: Option<String>,
  pub branch: Option<String>,
  pub enabled: bool,
  pub group: Option<String>,
}
