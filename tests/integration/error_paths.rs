use serde_json::json;

use evergreen_mcp::config::StaticCredentials;

use crate::common::{assert_conforms, compile_schema, harness, PATCH_ID};

#[test]
fn missing_credentials_fail_before_any_request() {
  let h = harness().credentials(StaticCredentials::default()).build();
  let out = h.err("list-projects", json!({}));

  assert_eq!(out["error"]["kind"], "authentication");
  assert_eq!(out["error"]["retryable"], false);
  assert!(h.requests().is_empty());
  assert_conforms(&compile_schema("error-envelope.schema.json"), &out);
}

#[test]
fn bearer_token_wins_over_api_key() {
  let h = harness()
    .credentials(StaticCredentials {
      user: Some("token.user".into()),
      api_key: Some("k".into()),
      token: Some("t".into()),
    })
    .build();
  h.ok("list-projects", json!({}));
  assert_eq!(h.requests()[0].user, "token.user");
}

#[test]
fn upstream_errors_map_to_kinds() {
  let envelope_schema = compile_schema("error-envelope.schema.json");

  let cases = [
    (json!({ "errors": [{ "message": "internal server error" }] }), "upstream_unavailable", true),
    (json!({ "errors": [{ "message": "you are not authenticated" }] }), "authentication", false),
    (
      json!({ "errors": [{ "message": "Cannot query field \"imageId\" on type \"Task\"" }] }),
      "schema_mismatch",
      false,
    ),
    (json!({ "data": { "projects": { "unexpected": true } } }), "schema_mismatch", false),
    (json!({ "data": {} }), "schema_mismatch", false),
    (json!([1, 2, 3]), "schema_mismatch", false),
  ];

  for (envelope, kind, retryable) in cases {
    let h = harness().reply("GetProjects", envelope.clone()).build();
    let out = h.err("list-projects", json!({}));
    assert_eq!(out["error"]["kind"], kind, "envelope {}", envelope);
    assert_eq!(out["error"]["retryable"], retryable, "envelope {}", envelope);
    assert_eq!(out["tool"], "list-projects");
    assert_conforms(&envelope_schema, &out);
  }
}

#[test]
fn missing_required_fragment_field_is_schema_mismatch() {
  let h = harness()
    .reply(
      "GetPatchFailedTasks",
      json!({ "data": { "patch": { "id": PATCH_ID, "status": "failed", "versionFull": {
        "id": PATCH_ID, "status": "failed",
        "tasks": { "count": 1, "data": [{ "id": "t1", "status": "failed" }] }
      } } } }),
    )
    .build();
  let out = h.err("get-failed-jobs", json!({ "patch_id": PATCH_ID }));

  assert_eq!(out["error"]["kind"], "schema_mismatch");
  assert!(out["error"]["message"].as_str().unwrap().contains("displayName"));
}

#[test]
fn unknown_tool_and_unknown_parameter() {
  let h = harness().build();
  let schema = compile_schema("error-envelope.schema.json");

  let out = h.err("get-everything", json!({}));
  assert_eq!(out["error"]["kind"], "unknown_tool");
  assert_conforms(&schema, &out);

  let out = h.err("list-projects", json!({ "verbose": true }));
  assert_eq!(out["error"]["kind"], "invalid_argument");
  assert_eq!(out["error"]["parameter"], "verbose");
  assert_conforms(&schema, &out);
}
