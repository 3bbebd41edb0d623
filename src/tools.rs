// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Dispatch table mapping tool names to declared parameter schemas and resolve -> query -> execute -> normalize pipelines
// role: tools/dispatch
// inputs: tool name + JSON arguments from the protocol layer; ToolContext built once at start-up
// outputs: ToolOutcome (payload JSON + is_error); JSON Schema per tool for tools/list
// side_effects: At most one upstream request per call, via the GraphqlApi seam
// invariants:
// - Arguments are validated against the declared schema before any network call; types are never coerced
// - Paging limits are clamped (never rejected); execution must be a non-negative integer
// - NotFound is a successful {found:false} payload; every other failure is an error envelope
// errors: UnknownTool, InvalidArgument, ProjectNotResolved, plus whatever the gateway/normalizer raise
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::config::{AdapterConfig, CredentialProvider, Credentials};
use crate::error::{AdapterError, AdapterResult};
use crate::normalize::failed_tasks::FailedJobs;
use crate::normalize::logs::LogListing;
use crate::normalize::patches::PatchListing;
use crate::normalize::projects::{ProjectDiscovery, ProjectListing};
use crate::normalize::test_results::TestListing;
use crate::normalize::{shape_output, LinkBuilder, NormalizeCtx, OutputShape};
use crate::resolve::{match_workspace, resolve_project, ProjectSources, Resolution};
use crate::upstream::catalog::{self, Bound, Query};
use crate::upstream::GraphqlApi;
use crate::util::Clock;

/// Upper bound for `execution`; the upstream takes a 32-bit Int.
const MAX_EXECUTION: i64 = i32::MAX as i64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
  /// Non-empty string identifier.
  Id,
  /// Integer paging limit, clamped into the bound.
  Limit(Bound),
  /// Non-negative integer index (rejected, not clamped, when out of range).
  Index { default: i64 },
  Flag { default: bool },
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
  pub name: &'static str,
  pub kind: ParamKind,
  pub required: bool,
  pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
  pub name: &'static str,
  pub description: &'static str,
  pub params: &'static [ParamSpec],
}

const PROJECT_ID: ParamSpec = ParamSpec {
  name: "project_id",
  kind: ParamKind::Id,
  required: false,
  description: "Evergreen project identifier. Auto-detected from the workspace when omitted.",
};

const EXECUTION: ParamSpec = ParamSpec {
  name: "execution",
  kind: ParamKind::Index { default: 0 },
  required: false,
  description: "Task execution (retry index, 0 = first run).",
};

const TASK_ID: ParamSpec = ParamSpec {
  name: "task_id",
  kind: ParamKind::Id,
  required: true,
  description: "Task identifier, as returned by get-failed-jobs.",
};

pub const TOOLS: &[ToolSpec] = &[
  ToolSpec {
    name: "discover-projects",
    description: "Rank the projects you have been patching recently by activity. \
                  Use it when the project is unknown or auto-detection reports low confidence.",
    params: &[ParamSpec {
      name: "max_patches",
      kind: ParamKind::Limit(catalog::DISCOVER_MAX_PATCHES),
      required: false,
      description: "How many recent patches to scan.",
    }],
  },
  ToolSpec {
    name: "list-recent-patches",
    description: "List your most recent Evergreen patches, newest first, with status and version info.",
    params: &[
      PROJECT_ID,
      ParamSpec {
        name: "limit",
        kind: ParamKind::Limit(catalog::PATCH_LIMIT),
        required: false,
        description: "Number of patches to return.",
      },
    ],
  },
  ToolSpec {
    name: "get-failed-jobs",
    description: "Failed tasks of a patch, each classified (test-failure, timeout, system-failure, \
                  setup-failure, unknown-failure) with test counts, log links and a summary.",
    params: &[
      ParamSpec {
        name: "patch_id",
        kind: ParamKind::Id,
        required: true,
        description: "Patch identifier, as returned by list-recent-patches.",
      },
      PROJECT_ID,
      ParamSpec {
        name: "max_results",
        kind: ParamKind::Limit(catalog::FAILED_TASK_MAX_RESULTS),
        required: false,
        description: "Maximum failed tasks to return.",
      },
    ],
  },
  ToolSpec {
    name: "get-task-tests",
    description: "Individual test results for one task execution, failed tests only by default.",
    params: &[
      TASK_ID,
      EXECUTION,
      ParamSpec {
        name: "failed_only",
        kind: ParamKind::Flag { default: true },
        required: false,
        description: "Only return failed tests.",
      },
      ParamSpec {
        name: "limit",
        kind: ParamKind::Limit(catalog::TEST_RESULT_LIMIT),
        required: false,
        description: "Maximum test results to return.",
      },
    ],
  },
  ToolSpec {
    name: "get-task-logs",
    description: "Log lines of one task execution. With filter_errors (default) only error and fatal \
                  lines are returned; an empty list means none matched, retry with filter_errors=false.",
    params: &[
      TASK_ID,
      EXECUTION,
      ParamSpec {
        name: "max_lines",
        kind: ParamKind::Limit(catalog::LOG_MAX_LINES),
        required: false,
        description: "Maximum log lines to return.",
      },
      ParamSpec {
        name: "filter_errors",
        kind: ParamKind::Flag { default: true },
        required: false,
        description: "Only return error and fatal lines.",
      },
    ],
  },
  ToolSpec {
    name: "list-projects",
    description: "All Evergreen projects visible to you, flattened from their organisation groups.",
    params: &[],
  },
];

pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
  TOOLS.iter().find(|t| t.name == name)
}

impl ParamSpec {
  fn schema(&self) -> Value {
    let mut s = match self.kind {
      ParamKind::Id => json!({ "type": "string", "minLength": 1 }),
      ParamKind::Limit(b) => json!({
        "type": "integer", "default": b.default, "minimum": b.min, "maximum": b.max,
      }),
      ParamKind::Index { default } => json!({
        "type": "integer", "default": default, "minimum": 0, "maximum": MAX_EXECUTION,
      }),
      ParamKind::Flag { default } => json!({ "type": "boolean", "default": default }),
    };
    s["description"] = json!(self.description);
    s
  }
}

impl ToolSpec {
  /// JSON Schema advertised through tools/list.
  pub fn input_schema(&self) -> Value {
    let properties: Map<String, Value> = self.params.iter().map(|p| (p.name.to_string(), p.schema())).collect();
    let required: Vec<&str> = self.params.iter().filter(|p| p.required).map(|p| p.name).collect();

    json!({
      "type": "object",
      "properties": properties,
      "required": required,
      "additionalProperties": false,
    })
  }

  pub fn describe(&self) -> Value {
    json!({
      "name": self.name,
      "description": self.description,
      "inputSchema": self.input_schema(),
    })
  }
}

/// Arguments that passed validation. Absent optionals are simply missing.
#[derive(Debug, Default)]
pub struct ToolArgs {
  values: Map<String, Value>,
}

impl ToolArgs {
  pub fn id(&self, name: &str) -> Option<&str> {
    self.values.get(name).and_then(Value::as_str)
  }

  /// Required id; validation guarantees presence, this guards against spec/handler drift.
  pub fn required_id(&self, name: &str) -> AdapterResult<&str> {
    self.id(name).ok_or_else(|| AdapterError::invalid_argument(name, "is required"))
  }

  pub fn int(&self, name: &str) -> Option<i64> {
    self.values.get(name).and_then(Value::as_i64)
  }

  /// A limit as given, including integers past `i64::MAX`; clamping happens in `Bound::apply`.
  pub fn limit(&self, name: &str) -> Option<i128> {
    let v = self.values.get(name)?;
    v.as_i64().map(i128::from).or_else(|| v.as_u64().map(i128::from))
  }

  pub fn flag(&self, name: &str, default: bool) -> bool {
    self.values.get(name).and_then(Value::as_bool).unwrap_or(default)
  }
}

pub fn validate_args(spec: &ToolSpec, args: &Value) -> AdapterResult<ToolArgs> {
  let empty = Map::new();
  let given = match args {
    Value::Null => &empty,
    Value::Object(m) => m,
    _ => return Err(AdapterError::invalid_argument("arguments", "must be a JSON object")),
  };

  if let Some(unknown) = given.keys().find(|k| !spec.params.iter().any(|p| p.name == k.as_str())) {
    return Err(AdapterError::invalid_argument(unknown, "is not a parameter of this tool"));
  }

  let mut values = Map::new();
  for p in spec.params {
    let v = match given.get(p.name) {
      None | Some(Value::Null) if p.required => return Err(AdapterError::invalid_argument(p.name, "is required")),
      None | Some(Value::Null) => continue,
      Some(v) => v,
    };

    let ok = match p.kind {
      ParamKind::Id => match v.as_str() {
        Some(s) if !s.trim().is_empty() => {
          values.insert(p.name.to_string(), json!(s.trim()));
          continue;
        }
        Some(_) => return Err(AdapterError::invalid_argument(p.name, "must be a non-empty string")),
        None => false,
      },
      ParamKind::Limit(_) => v.is_i64() || v.is_u64(),
      ParamKind::Index { .. } => match v.as_i64() {
        Some(n) if (0..=MAX_EXECUTION).contains(&n) => true,
        Some(_) => {
          return Err(AdapterError::invalid_argument(
            p.name,
            format!("must be a non-negative integer no larger than {}", MAX_EXECUTION),
          ))
        }
        None => false,
      },
      ParamKind::Flag { .. } => v.is_boolean(),
    };

    if !ok {
      let expected = match p.kind {
        ParamKind::Id => "must be a string",
        ParamKind::Limit(_) | ParamKind::Index { .. } => "must be an integer",
        ParamKind::Flag { .. } => "must be a boolean",
      };
      return Err(AdapterError::invalid_argument(p.name, expected));
    }
    values.insert(p.name.to_string(), v.clone());
  }

  Ok(ToolArgs { values })
}

/// Everything a tool call needs; built once, shared read-only by every call.
pub struct ToolContext {
  pub config: AdapterConfig,
  pub api: Box<dyn GraphqlApi>,
  pub credentials: Box<dyn CredentialProvider>,
  pub clock: Box<dyn Clock>,
  links: LinkBuilder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
  pub payload: Value,
  pub is_error: bool,
}

impl ToolContext {
  pub fn new(
    config: AdapterConfig,
    api: Box<dyn GraphqlApi>,
    credentials: Box<dyn CredentialProvider>,
    clock: Box<dyn Clock>,
  ) -> AdapterResult<Self> {
    let links = LinkBuilder::new(&config.ui_base)?;
    Ok(Self {
      config,
      api,
      credentials,
      clock,
      links,
    })
  }

  fn sources(&self) -> ProjectSources<'_> {
    ProjectSources {
      directory_projects: &self.config.directory_projects,
      static_projects: &self.config.static_projects,
    }
  }

  fn resolve(&self, explicit: Option<&str>) -> AdapterResult<Resolution> {
    let r = resolve_project(
      explicit,
      self.config.project_override.as_deref(),
      &self.config.workspace_dir,
      &self.sources(),
    );
    match &r {
      Ok(res) => debug!(resolution = ?res, "project resolution"),
      Err(e) => debug!(error = %e, "project resolution failed"),
    }
    r
  }

  fn run(&self, query: Query, creds: &Credentials, shape: &dyn OutputShape) -> AdapterResult<Value> {
    let root = self.api.execute(&query, creds)?;
    let ctx = NormalizeCtx {
      links: &self.links,
      clock: self.clock.as_ref(),
    };
    shape_output(shape, &root, &ctx)
  }

  /// Entry point for the protocol layer.
  pub fn call_tool(&self, name: &str, args: &Value) -> ToolOutcome {
    info!(tool = name, "tool call");

    match self.dispatch(name, args) {
      Ok(payload) => ToolOutcome {
        payload,
        is_error: false,
      },
      Err(AdapterError::NotFound { kind, id }) => {
        info!(tool = name, kind = %kind, id = %id, "not found upstream");
        let message = AdapterError::NotFound {
          kind: kind.clone(),
          id: id.clone(),
        }
        .to_string();
        ToolOutcome {
          payload: json!({
            "found": false,
            "kind": "not_found",
            "resource": kind,
            "identifier": id,
            "message": message,
            "tool": name,
          }),
          is_error: false,
        }
      }
      Err(e) => {
        info!(tool = name, kind = e.kind(), "tool call failed: {}", e);
        ToolOutcome {
          payload: e.to_json(name),
          is_error: true,
        }
      }
    }
  }

  pub fn dispatch(&self, name: &str, args: &Value) -> AdapterResult<Value> {
    let spec = find_tool(name).ok_or_else(|| AdapterError::UnknownTool(name.to_string()))?;
    let args = validate_args(spec, args)?;

    match spec.name {
      "discover-projects" => self.discover_projects(&args),
      "list-recent-patches" => self.list_recent_patches(&args),
      "get-failed-jobs" => self.get_failed_jobs(&args),
      "get-task-tests" => self.get_task_tests(&args),
      "get-task-logs" => self.get_task_logs(&args),
      "list-projects" => self.list_projects(),
      other => Err(AdapterError::UnknownTool(other.to_string())),
    }
  }

  fn discover_projects(&self, args: &ToolArgs) -> AdapterResult<Value> {
    let max_patches = catalog::DISCOVER_MAX_PATCHES.apply(args.limit("max_patches"));
    let creds = self.credentials.credentials()?;
    let shape = ProjectDiscovery {
      user_id: creds.user().to_string(),
      max_patches,
      configured_projects: self.config.static_projects.clone(),
      workspace_project: match_workspace(&self.config.workspace_dir, &self.config.directory_projects)
        .map(str::to_string),
    };
    self.run(catalog::user_patches(creds.user(), max_patches.effective), &creds, &shape)
  }

  fn list_recent_patches(&self, args: &ToolArgs) -> AdapterResult<Value> {
    let limit = catalog::PATCH_LIMIT.apply(args.limit("limit"));
    let resolution = self.resolve(args.id("project_id"))?;
    let creds = self.credentials.credentials()?;

    let project_filter = resolution.project_id().map(str::to_string);
    // Filtering happens client-side, so scan the widest page when a project is set.
    let fetch = if project_filter.is_some() {
      catalog::PATCH_LIMIT.max
    } else {
      limit.effective
    };

    let shape = PatchListing {
      user_id: creds.user().to_string(),
      project_filter,
      project_resolution: resolution.to_json(),
      limit,
    };
    self.run(catalog::user_patches(creds.user(), fetch), &creds, &shape)
  }

  fn get_failed_jobs(&self, args: &ToolArgs) -> AdapterResult<Value> {
    let patch_id = args.required_id("patch_id")?;
    let max_results = catalog::FAILED_TASK_MAX_RESULTS.apply(args.limit("max_results"));
    // The patch id alone identifies the work; resolution only annotates the result.
    let resolution = self.resolve(args.id("project_id")).ok();
    let creds = self.credentials.credentials()?;

    let shape = FailedJobs {
      max_results,
      resolution,
    };
    self.run(catalog::patch_failed_tasks(patch_id), &creds, &shape)
  }

  fn get_task_tests(&self, args: &ToolArgs) -> AdapterResult<Value> {
    let task_id = args.required_id("task_id")?;
    let execution = args.int("execution").unwrap_or(0) as u32;
    let failed_only = args.flag("failed_only", true);
    let limit = catalog::TEST_RESULT_LIMIT.apply(args.limit("limit"));
    let creds = self.credentials.credentials()?;

    let shape = TestListing { failed_only, limit };
    self.run(
      catalog::task_tests(task_id, execution, failed_only, limit.effective),
      &creds,
      &shape,
    )
  }

  fn get_task_logs(&self, args: &ToolArgs) -> AdapterResult<Value> {
    let task_id = args.required_id("task_id")?;
    let execution = args.int("execution").unwrap_or(0) as u32;
    let shape = LogListing {
      max_lines: catalog::LOG_MAX_LINES.apply(args.limit("max_lines")),
      filter_errors: args.flag("filter_errors", true),
    };
    let creds = self.credentials.credentials()?;

    self.run(catalog::task_logs(task_id, execution), &creds, &shape)
  }

  fn list_projects(&self) -> AdapterResult<Value> {
    let creds = self.credentials.credentials()?;
    self.run(catalog::projects(), &creds, &ProjectListing)
  }
}
