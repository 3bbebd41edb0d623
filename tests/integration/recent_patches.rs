use serde_json::json;

use crate::common::{compile_schema, assert_conforms, harness, NOW, TWO_PROJECTS_YAML};

fn ids(out: &serde_json::Value) -> Vec<String> {
  out["patches"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["patch_id"].as_str().unwrap().to_string())
    .collect()
}

#[test]
fn limit_three_of_five_newest_first() {
  let h = harness().config_yaml(TWO_PROJECTS_YAML).build();
  let out = h.ok("list-recent-patches", json!({ "limit": 3 }));

  assert_eq!(
    ids(&out),
    vec![
      "65f0a1b2c3d4e5f6a7b8c9d5",
      "65f0a1b2c3d4e5f6a7b8c9d2",
      "65f0a1b2c3d4e5f6a7b8c9d1"
    ]
  );
  assert_eq!(out["total_patches"], 5);
  assert_eq!(out["returned_patches"], 3);
  assert_eq!(out["truncated"], true);
  assert_eq!(out["user_id"], "dev.user");

  let first = &out["patches"][0];
  assert_eq!(first["create_time"], "2025-03-05T18:00:00+00:00");
  assert_eq!(first["has_version"], true);
  assert_eq!(first["version_id"], "65f0a1b2c3d4e5f6a7b8c9d5");
  let second = &out["patches"][1];
  assert_eq!(second["has_version"], false);
  assert!(second["version_status"].is_null());

  let req = &h.requests()[0];
  assert_eq!(req.operation, "GetUserRecentPatches");
  assert_eq!(req.variables["userId"], "dev.user");
  assert_eq!(req.variables["limit"], 3);
  assert_eq!(req.user, "dev.user");
}

#[test]
fn project_filter_applies_before_the_limit() {
  let h = harness().build();
  let out = h.ok("list-recent-patches", json!({ "project_id": "mongodb-mongo-master", "limit": 2 }));

  assert_eq!(ids(&out), vec!["65f0a1b2c3d4e5f6a7b8c9d2", "65f0a1b2c3d4e5f6a7b8c9d1"]);
  assert_eq!(out["total_patches"], 3);
  assert_eq!(out["truncated"], true);
  assert!(out["patches"]
    .as_array()
    .unwrap()
    .iter()
    .all(|p| p["project_identifier"] == "mongodb-mongo-master"));

  // Filtering is client-side, so the widest page is requested.
  assert_eq!(h.requests()[0].variables["limit"], 50);
}

#[test]
fn out_of_range_limits_are_clamped_and_reported() {
  let h = harness().config_yaml(TWO_PROJECTS_YAML).build();
  let meta_schema = compile_schema("meta.schema.json");

  let out = h.ok("list-recent-patches", json!({ "limit": 0 }));
  assert_eq!(out["meta"]["limit"], json!({ "requested": 0, "effective": 1, "clamped": true }));
  assert_eq!(out["returned_patches"], 1);
  assert_conforms(&meta_schema, &out["meta"]);

  let out = h.ok("list-recent-patches", json!({ "limit": 500 }));
  assert_eq!(out["meta"]["limit"], json!({ "requested": 500, "effective": 50, "clamped": true }));
  assert_eq!(out["meta"]["generated_at"], NOW);

  let out = h.ok("list-recent-patches", json!({}));
  assert_eq!(out["meta"]["limit"], json!({ "requested": null, "effective": 10, "clamped": false }));
  assert_eq!(out["truncated"], false);
}

#[test]
fn discover_ranks_projects_by_activity() {
  let h = harness().config_yaml(TWO_PROJECTS_YAML).build();
  let out = h.ok("discover-projects", json!({}));

  assert_eq!(out["patches_scanned"], 5);
  assert_eq!(out["total_projects"], 2);
  assert_eq!(out["projects"][0]["project_identifier"], "mongodb-mongo-master");
  assert_eq!(out["projects"][0]["patch_count"], 3);
  assert_eq!(out["projects"][0]["latest_patch_time"], "2025-03-04T12:30:00+00:00");
  assert_eq!(out["projects"][1]["project_identifier"], "mongo-tools");
  assert_eq!(out["configured_projects"], json!(["mongodb-mongo-master", "mongo-tools"]));
  assert!(out["workspace_project"].is_null());
  assert!(out["hint"].as_str().unwrap().contains("mongodb-mongo-master"));
  assert_eq!(out["meta"]["limit"]["effective"], 50);

  let out = h.ok("discover-projects", json!({ "max_patches": 2 }));
  assert_eq!(out["patches_scanned"], 2);
  assert_eq!(h.requests()[1].variables["limit"], 2);
}

#[test]
fn list_projects_flattens_groups() {
  let h = harness().build();
  let out = h.ok("list-projects", json!({}));

  assert_eq!(out["total_count"], 3);
  assert_eq!(out["enabled_count"], 2);
  let tools = out["projects"]
    .as_array()
    .unwrap()
    .iter()
    .find(|p| p["identifier"] == "mongo-tools")
    .unwrap();
  assert_eq!(tools["group"], "mongodb/mongo-tools");
  assert_eq!(tools["enabled"], true);
  assert!(out["meta"]["limit"].is_null());
}
