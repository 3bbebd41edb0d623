use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::Value;

use evergreen_mcp::config::{AdapterConfig, ConfigOverrides, Credentials, FileConfig, StaticCredentials};
use evergreen_mcp::error::AdapterResult;
use evergreen_mcp::tools::{ToolContext, ToolOutcome};
use evergreen_mcp::upstream::{interpret_envelope, FixtureGraphqlApi, GraphqlApi, Query};
use evergreen_mcp::util::FixedClock;

pub const NOW: &str = "2025-03-06T12:00:00+00:00";
pub const PATCH_ID: &str = "65f0a1b2c3d4e5f6a7b8c9d1";
pub const JSCORE_TASK: &str = "mongodb_mongo_master_linux_64_jsCore_patch_1a2b3c_25_03_03_09_15_00";

/// One upstream request as the gateway saw it.
#[derive(Debug, Clone)]
pub struct Seen {
  pub operation: String,
  pub variables: Value,
  pub user: String,
}

/// Replays `tests/fixtures/upstream`, with per-operation overrides, and records every request.
struct RecordingApi {
  fixtures: FixtureGraphqlApi,
  replies: HashMap<&'static str, Value>,
  seen: Arc<Mutex<Vec<Seen>>>,
}

impl GraphqlApi for RecordingApi {
  fn execute(&self, query: &Query, credentials: &Credentials) -> AdapterResult<Value> {
    self.seen.lock().unwrap().push(Seen {
      operation: query.operation.to_string(),
      variables: query.variables.clone(),
      user: credentials.user().to_string(),
    });
    match self.replies.get(query.operation) {
      Some(envelope) => interpret_envelope(query, envelope),
      None => self.fixtures.execute(query, credentials),
    }
  }
}

pub struct Harness {
  pub ctx: ToolContext,
  seen: Arc<Mutex<Vec<Seen>>>,
}

impl Harness {
  pub fn call(&self, tool: &str, args: Value) -> ToolOutcome {
    self.ctx.call_tool(tool, &args)
  }

  /// Payload of a call that must succeed.
  pub fn ok(&self, tool: &str, args: Value) -> Value {
    let out = self.call(tool, args);
    assert!(!out.is_error, "{} failed: {}", tool, out.payload);
    out.payload
  }

  /// Payload of a call that must fail.
  pub fn err(&self, tool: &str, args: Value) -> Value {
    let out = self.call(tool, args);
    assert!(out.is_error, "{} unexpectedly succeeded: {}", tool, out.payload);
    out.payload
  }

  pub fn requests(&self) -> Vec<Seen> {
    self.seen.lock().unwrap().clone()
  }
}

pub struct HarnessBuilder {
  yaml: String,
  overrides: ConfigOverrides,
  replies: HashMap<&'static str, Value>,
  credentials: StaticCredentials,
}

pub fn harness() -> HarnessBuilder {
  HarnessBuilder {
    yaml: String::new(),
    overrides: ConfigOverrides::default(),
    replies: HashMap::new(),
    credentials: StaticCredentials {
      user: Some("dev.user".into()),
      api_key: Some("0123456789abcdef".into()),
      token: None,
    },
  }
}

impl HarnessBuilder {
  /// Contents of the evergreen YAML config file.
  pub fn config_yaml(mut self, yaml: &str) -> Self {
    self.yaml = yaml.to_string();
    self
  }

  pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
    self.overrides = overrides;
    self
  }

  /// Serve `envelope` for `operation` instead of the fixture file.
  pub fn reply(mut self, operation: &'static str, envelope: Value) -> Self {
    self.replies.insert(operation, envelope);
    self
  }

  pub fn credentials(mut self, credentials: StaticCredentials) -> Self {
    self.credentials = credentials;
    self
  }

  pub fn build(self) -> Harness {
    test_support::init_tracing();

    let file = FileConfig::parse(&self.yaml).expect("valid test YAML");
    let cfg = AdapterConfig::build(&self.overrides, |_| None, file, None).expect("valid test config");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let api = RecordingApi {
      fixtures: FixtureGraphqlApi::new(test_support::upstream_fixtures_dir()),
      replies: self.replies,
      seen: Arc::clone(&seen),
    };
    let now: DateTime<Utc> = DateTime::parse_from_rfc3339(NOW).unwrap().with_timezone(&Utc);
    let ctx = ToolContext::new(cfg, Box::new(api), Box::new(self.credentials), Box::new(FixedClock(now)))
      .expect("tool context");

    Harness { ctx, seen }
  }
}

/// Two configured projects and no workspace mapping: resolution is low confidence.
pub const TWO_PROJECTS_YAML: &str = "\
user: dev.user
projects:
  - name: mongodb-mongo-master
  - name: mongo-tools
";

pub fn compile_schema(name: &str) -> jsonschema::Validator {
  let schema = test_support::read_schema(name);
  jsonschema::validator_for(&schema).expect("compile schema")
}

pub fn assert_conforms(validator: &jsonschema::Validator, instance: &Value) {
  let errors: Vec<String> = validator.iter_errors(instance).map(|e| e.to_string()).collect();
  assert!(errors.is_empty(), "schema violations: {:#?}\n{}", errors, instance);
}
