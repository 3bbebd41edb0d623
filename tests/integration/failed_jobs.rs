use serde_json::{json, Value};

use crate::common::{assert_conforms, compile_schema, harness, JSCORE_TASK, PATCH_ID};

fn task<'a>(out: &'a Value, name: &str) -> &'a Value {
  out["failed_tasks"]
    .as_array()
    .unwrap()
    .iter()
    .find(|t| t["task_name"] == name)
    .unwrap_or_else(|| panic!("no task {}", name))
}

#[test]
fn classifies_every_failed_task() {
  test_support::init_insta();
  let h = harness().build();
  let out = h.ok("get-failed-jobs", json!({ "patch_id": PATCH_ID }));

  let lines: Vec<String> = out["failed_tasks"]
    .as_array()
    .unwrap()
    .iter()
    .map(|t| {
      format!(
        "{} {} exec={} tests={}/{}",
        t["task_name"].as_str().unwrap(),
        t["classification"].as_str().unwrap(),
        t["execution"],
        t["test_info"]["failed_test_count"],
        t["test_info"]["total_test_count"],
      )
    })
    .collect();

  insta::assert_snapshot!(lines.join("\n"), @r"
  jsCore test-failure exec=0 tests=2/3
  sharding timeout exec=1 tests=0/0
  compile setup-failure exec=0 tests=0/0
  unittests system-failure exec=0 tests=0/0
  ");

  assert_conforms(&compile_schema("failed-jobs.schema.json"), &out);
}

#[test]
fn tasks_carry_version_host_and_links() {
  let h = harness().build();
  let out = h.ok("get-failed-jobs", json!({ "patch_id": PATCH_ID }));

  let js = task(&out, "jsCore");
  assert_eq!(js["task_id"], JSCORE_TASK);
  assert_eq!(js["version_id"], PATCH_ID);
  assert_eq!(js["build_variant"], "linux-64");
  assert_eq!(js["finish_time"], "2025-03-03T10:02:11+00:00");
  assert_eq!(js["duration_ms"], 1843000);
  assert_eq!(js["host"]["ami"], "ami-0abc1234");
  assert_eq!(js["host"]["distro_id"], "rhel80-medium");
  assert_eq!(js["test_info"]["has_test_results"], true);
  assert_eq!(
    js["logs"]["task_log"],
    format!("https://evergreen.mongodb.com/task_log_raw/{}/0?type=T&text=true", JSCORE_TASK)
  );
  assert_eq!(
    js["logs"]["task_page"],
    format!("https://evergreen.mongodb.com/task/{}/0", JSCORE_TASK)
  );
  assert!(js["recommendation"].as_str().unwrap().contains("get-task-tests"));

  let sharding = task(&out, "sharding");
  assert_eq!(sharding["failure_details"]["timed_out"], true);
  assert_eq!(sharding["failure_details"]["timeout_type"], "exec");
  assert!(sharding["logs"]["all_logs"].as_str().unwrap().contains("/1?type=ALL"));

  let unittests = task(&out, "unittests");
  assert!(unittests["host"]["ami"].is_null());
  assert_eq!(unittests["test_info"]["has_test_results"], false);

  assert_eq!(out["patch_info"]["patch_number"], 1201);
  assert_eq!(out["patch_info"]["create_time"], "2025-03-03T09:15:00+00:00");
  assert_eq!(out["version_info"]["revision"], "1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d");

  let req = &h.requests()[0];
  assert_eq!(req.operation, "GetPatchFailedTasks");
  assert_eq!(req.variables["patchId"], PATCH_ID);
}

#[test]
fn summary_covers_all_fetched_tasks() {
  let h = harness().build();
  let out = h.ok("get-failed-jobs", json!({ "patch_id": PATCH_ID }));
  let s = &out["summary"];

  assert_eq!(s["total_failed_tasks"], 4);
  assert_eq!(s["returned_tasks"], 4);
  assert_eq!(s["truncated"], false);
  assert_eq!(s["has_timeouts"], true);
  assert_eq!(s["failed_build_variants"], json!(["linux-64", "macos", "windows"]));
  assert_eq!(
    s["by_classification"],
    json!({
      "test-failure": 1, "timeout": 1, "system-failure": 1, "setup-failure": 1, "unknown-failure": 0
    })
  );

  let out = h.ok("get-failed-jobs", json!({ "patch_id": PATCH_ID, "max_results": 2 }));
  assert_eq!(out["failed_tasks"].as_array().unwrap().len(), 2);
  assert_eq!(out["summary"]["total_failed_tasks"], 4);
  assert_eq!(out["summary"]["returned_tasks"], 2);
  assert_eq!(out["summary"]["truncated"], true);
  assert_eq!(out["summary"]["by_classification"]["system-failure"], 1);
  assert_eq!(out["meta"]["limit"]["effective"], 2);
}

#[test]
fn unknown_patch_is_a_not_found_result() {
  let h = harness().build();
  let out = h.call("get-failed-jobs", json!({ "patch_id": "missing-patch" }));

  assert!(!out.is_error);
  assert_eq!(out.payload["found"], false);
  assert_eq!(out.payload["kind"], "not_found");
  assert_eq!(out.payload["resource"], "patch");
  assert_eq!(out.payload["identifier"], "missing-patch");
  assert_eq!(out.payload["tool"], "get-failed-jobs");
}

#[test]
fn project_mismatch_is_flagged() {
  let h = harness().build();
  let out = h.ok("get-failed-jobs", json!({ "patch_id": PATCH_ID, "project_id": "mongo-tools" }));
  let check = &out["project_check"];

  assert_eq!(check["patch_project"], "mongodb-mongo-master");
  assert_eq!(check["consistent"], false);
  assert!(check["warning"].as_str().unwrap().contains("mongodb-mongo-master"));

  let out = h.ok(
    "get-failed-jobs",
    json!({ "patch_id": PATCH_ID, "project_id": "mongodb-mongo-master" }),
  );
  assert_eq!(out["project_check"]["consistent"], true);
  assert!(out["project_check"]["warning"].is_null());
}

#[test]
fn patch_without_version_has_no_tasks() {
  let h = harness()
    .reply(
      "GetPatchFailedTasks",
      json!({ "data": { "patch": { "id": "p-new", "status": "created", "versionFull": null } } }),
    )
    .build();
  let out = h.ok("get-failed-jobs", json!({ "patch_id": "p-new" }));

  assert!(out["version_info"].is_null());
  assert_eq!(out["failed_tasks"], json!([]));
  assert_eq!(out["summary"]["total_failed_tasks"], 0);
}

#[test]
fn failed_test_count_matches_task_tests() {
  let h = harness().build();
  let jobs = h.ok("get-failed-jobs", json!({ "patch_id": PATCH_ID }));
  let js = task(&jobs, "jsCore");

  let tests = h.ok(
    "get-task-tests",
    json!({ "task_id": js["task_id"], "execution": js["execution"] }),
  );
  assert_eq!(js["test_info"]["failed_test_count"], tests["summary"]["failed_tests_in_results"]);
  let fails = tests["test_results"]
    .as_array()
    .unwrap()
    .iter()
    .filter(|r| r["status"] == "fail")
    .count();
  assert_eq!(js["test_info"]["failed_test_count"], fails as u64);
}

#[test]
fn summary_and_meta_snapshot() {
  test_support::init_insta();
  let h = harness().build();
  let out = h.ok("get-failed-jobs", json!({ "patch_id": PATCH_ID, "max_results": 2 }));

  insta::with_settings!({ sort_maps => true }, {
    insta::assert_json_snapshot!(out["summary"], @r#"
    {
      "by_classification": {
        "setup-failure": 1,
        "system-failure": 1,
        "test-failure": 1,
        "timeout": 1,
        "unknown-failure": 0
      },
      "failed_build_variants": [
        "linux-64",
        "macos",
        "windows"
      ],
      "has_timeouts": true,
      "returned_tasks": 2,
      "total_failed_tasks": 4,
      "truncated": true
    }
    "#);

    insta::assert_json_snapshot!(out["meta"], { ".generated_at" => "[generated_at]" }, @r#"
    {
      "generated_at": "[generated_at]",
      "limit": {
        "clamped": false,
        "effective": 2,
        "requested": 2
      }
    }
    "#);
  });
}
