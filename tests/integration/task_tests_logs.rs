use serde_json::json;

use crate::common::{harness, JSCORE_TASK};

#[test]
fn failed_tests_only_by_default() {
  let h = harness().build();
  let out = h.ok("get-task-tests", json!({ "task_id": JSCORE_TASK }));

  assert_eq!(out["task_info"]["task_name"], "jsCore");
  assert_eq!(out["task_info"]["execution"], 0);
  let s = &out["summary"];
  assert_eq!(s["total_test_results"], 3);
  assert_eq!(s["filtered_test_count"], 2);
  assert_eq!(s["returned_tests"], 2);
  assert_eq!(s["failed_tests_in_results"], 2);
  assert_eq!(s["filter_applied"], "failed tests only");
  assert_eq!(out["truncated"], false);

  let first = &out["test_results"][0];
  assert_eq!(first["test_file"], "jstests/core/index_build_abort.js");
  assert_eq!(first["status"], "fail");
  assert_eq!(first["end_time"], "2025-03-03T09:40:12+00:00");
  assert_eq!(first["logs"]["line_num"], 120);
  assert!(out["test_results"][1]["logs"].is_null());

  let req = &h.requests()[0];
  assert_eq!(req.operation, "GetTaskTestResults");
  assert_eq!(req.variables["execution"], 0);
  assert_eq!(req.variables["testFilterOptions"]["limit"], 100);
  assert!(req.variables["testFilterOptions"]["statuses"].is_array());
}

#[test]
fn all_tests_when_filter_is_off() {
  let h = harness().build();
  let out = h.ok(
    "get-task-tests",
    json!({ "task_id": JSCORE_TASK, "failed_only": false, "execution": 1, "limit": 1 }),
  );

  assert_eq!(out["summary"]["filter_applied"], "all tests");
  assert_eq!(out["summary"]["returned_tests"], 1);
  assert_eq!(out["truncated"], true);

  let req = &h.requests()[0];
  assert_eq!(req.variables["execution"], 1);
  assert!(req.variables["testFilterOptions"].get("statuses").is_none());
  assert_eq!(req.variables["testFilterOptions"]["limit"], 1);
}

#[test]
fn error_filter_may_return_nothing() {
  let h = harness().build();
  let out = h.ok("get-task-logs", json!({ "task_id": JSCORE_TASK }));

  assert_eq!(out["logs"], json!([]));
  assert_eq!(out["total_lines"], 0);
  assert_eq!(out["returned_lines"], 0);
  assert_eq!(out["unfiltered_lines"], 4);
  assert_eq!(out["filter_applied"], "error and fatal only");
  assert_eq!(out["truncated"], false);
  assert_eq!(out["host"]["host_id"], "i-0123456789abcdef0");

  let all = h.ok("get-task-logs", json!({ "task_id": JSCORE_TASK, "filter_errors": false }));
  let severities: Vec<&str> = all["logs"]
    .as_array()
    .unwrap()
    .iter()
    .map(|l| l["severity"].as_str().unwrap())
    .collect();
  assert_eq!(severities, vec!["info", "info", "warning", "info"]);
  assert_eq!(all["filter_applied"], "none");
  assert_eq!(all["logs"][0]["type"], "agent");
  assert_eq!(all["logs"][0]["timestamp"], "2025-03-03T09:30:00+00:00");
}

#[test]
fn error_filter_keeps_error_and_fatal_lines() {
  let h = harness().build();
  let out = h.ok("get-task-logs", json!({ "task_id": "task-with-errors", "execution": 2 }));

  let severities: Vec<&str> = out["logs"]
    .as_array()
    .unwrap()
    .iter()
    .map(|l| l["severity"].as_str().unwrap())
    .collect();
  assert_eq!(severities, vec!["error", "error", "fatal"]);
  assert_eq!(out["unfiltered_lines"], 5);
  assert_eq!(out["execution"], 2);
  assert!(out["links"]["all_logs"].as_str().unwrap().ends_with("/task-with-errors/2?type=ALL&text=true"));

  let capped = h.ok(
    "get-task-logs",
    json!({ "task_id": "task-with-errors", "execution": 2, "max_lines": 2 }),
  );
  assert_eq!(capped["returned_lines"], 2);
  assert_eq!(capped["total_lines"], 3);
  assert_eq!(capped["truncated"], true);
  assert_eq!(capped["meta"]["limit"], json!({ "requested": 2, "effective": 2, "clamped": false }));
}

#[test]
fn bad_execution_never_reaches_upstream() {
  let h = harness().build();

  let out = h.err("get-task-logs", json!({ "task_id": JSCORE_TASK, "execution": -1 }));
  assert_eq!(out["error"]["kind"], "invalid_argument");
  assert_eq!(out["error"]["parameter"], "execution");

  let out = h.err("get-task-tests", json!({ "task_id": JSCORE_TASK, "execution": "0" }));
  assert_eq!(out["error"]["parameter"], "execution");

  let out = h.err("get-task-tests", json!({}));
  assert_eq!(out["error"]["parameter"], "task_id");

  assert!(h.requests().is_empty());
}
