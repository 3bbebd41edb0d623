use serde_json::json;

use evergreen_mcp::tools::{find_tool, TOOLS};

#[test]
fn advertises_six_tools_in_table_order() {
  test_support::init_insta();
  let names: Vec<&str> = TOOLS.iter().map(|t| t.name).collect();
  insta::assert_snapshot!(names.join("\n"), @r"
  discover-projects
  list-recent-patches
  get-failed-jobs
  get-task-tests
  get-task-logs
  list-projects
  ");
}

#[test]
fn every_input_schema_compiles() {
  for tool in TOOLS {
    let schema = tool.input_schema();
    let validator = jsonschema::validator_for(&schema)
      .unwrap_or_else(|e| panic!("{} has an invalid input schema: {}", tool.name, e));
    assert!(validator.is_valid(&json!({})) || !schema["required"].as_array().unwrap().is_empty());
  }
}

#[test]
fn input_schema_agrees_with_validation() {
  let spec = find_tool("get-task-logs").unwrap();
  let validator = jsonschema::validator_for(&spec.input_schema()).unwrap();

  assert!(validator.is_valid(&json!({ "task_id": "t1" })));
  assert!(validator.is_valid(&json!({ "task_id": "t1", "execution": 3, "filter_errors": false })));
  assert!(!validator.is_valid(&json!({ "task_id": "t1", "execution": -1 })));
  assert!(!validator.is_valid(&json!({ "task_id": "t1", "verbose": true })));
  assert!(!validator.is_valid(&json!({ "execution": 0 })));
}
