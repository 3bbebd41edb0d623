// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Fixed GraphQL documents and the variable binding for each tool, including paging bounds
// role: upstream/catalog
// inputs: validated tool arguments (identifiers, clamped limits, execution index)
// outputs: Query values (operation name, document, variables, expected root field, subject for not-found)
// invariants:
// - Out-of-range limits are clamped, never rejected; Bounded records requested vs effective
// - Variables use the upstream's camelCase names and JSON types (String ids, Int limits)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::Serialize;
use serde_json::{json, Value};

/// Test statuses that count as failures, matched case-insensitively.
pub const FAILED_TEST_STATUSES: [&str; 2] = ["fail", "failed"];

/// Identifier a query is about; used to report NotFound.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
  pub kind: &'static str,
  pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
  pub operation: &'static str,
  pub document: &'static str,
  pub variables: Value,
  /// Field under `data` that must be present in a successful reply.
  pub root_field: &'static str,
  pub subject: Option<Subject>,
}

impl Query {
  /// Request body for a GraphQL POST.
  pub fn body(&self) -> Value {
    json!({
      "operationName": self.operation,
      "query": self.document,
      "variables": self.variables,
    })
  }
}

/// Documented paging bound for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
  pub default: u32,
  pub min: u32,
  pub max: u32,
}

/// Outcome of clamping a requested limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounded {
  pub requested: Option<i128>,
  pub effective: u32,
  pub clamped: bool,
}

impl Bound {
  pub const fn new(default: u32, min: u32, max: u32) -> Self {
    Self { default, min, max }
  }

  pub fn apply(&self, requested: Option<i128>) -> Bounded {
    match requested {
      None => Bounded {
        requested: None,
        effective: self.default,
        clamped: false,
      },
      Some(n) => {
        let effective = n.clamp(self.min as i128, self.max as i128) as u32;
        Bounded {
          requested: Some(n),
          effective,
          clamped: effective as i128 != n,
        }
      }
    }
  }
}

pub const DISCOVER_MAX_PATCHES: Bound = Bound::new(50, 1, 50);
pub const PATCH_LIMIT: Bound = Bound::new(10, 1, 50);
pub const FAILED_TASK_MAX_RESULTS: Bound = Bound::new(50, 1, 100);
pub const TEST_RESULT_LIMIT: Bound = Bound::new(100, 1, 500);
pub const LOG_MAX_LINES: Bound = Bound::new(1000, 1, 1000);

/// Upstream page size for failed tasks; max_results truncates below this.
pub const FAILED_TASK_FETCH: u32 = 100;

const USER_PATCHES: &str = r#"query GetUserRecentPatches($userId: String!, $limit: Int = 10) {
  user(userId: $userId) {
    patches(patchesInput: {limit: $limit, page: 0, patchName: "", statuses: [], includeHidden: false}) {
      patches {
        id
        githash
        description
        author
        authorDisplayName
        status
        createTime
        patchNumber
        projectIdentifier
        versionFull {
          id
          status
        }
      }
    }
  }
}"#;

const PATCH_FAILED_TASKS: &str = r#"query GetPatchFailedTasks($patchId: String!, $limit: Int!) {
  patch(patchId: $patchId) {
    id
    githash
    description
    author
    authorDisplayName
    status
    createTime
    patchNumber
    projectIdentifier
    versionFull {
      id
      revision
      author
      createTime
      status
      tasks(options: {statuses: ["failed", "system-failed", "setup-failed", "task-timed-out", "test-timed-out", "system-timed-out"], limit: $limit}) {
        count
        data {
          id
          displayName
          buildVariant
          status
          execution
          finishTime
          timeTaken
          ami
          hostId
          distroId
          imageId
          details {
            description
            status
            timedOut
            timeoutType
            failingCommand
          }
          tests {
            testResults {
              status
            }
          }
        }
      }
    }
  }
}"#;

const TASK_TESTS: &str = r#"query GetTaskTestResults($taskId: String!, $execution: Int, $testFilterOptions: TestFilterOptions) {
  task(taskId: $taskId, execution: $execution) {
    id
    displayName
    buildVariant
    status
    execution
    tests(opts: $testFilterOptions) {
      totalTestCount
      filteredTestCount
      testResults {
        id
        testFile
        status
        duration
        startTime
        endTime
        exitCode
        groupID
        logs {
          url
          urlParsley
          urlRaw
          lineNum
          renderingType
          version
        }
      }
    }
  }
}"#;

const TASK_LOGS: &str = r#"query GetTaskLogs($taskId: String!, $execution: Int) {
  task(taskId: $taskId, execution: $execution) {
    id
    displayName
    buildVariant
    status
    execution
    ami
    hostId
    distroId
    imageId
    taskLogs {
      taskId
      execution
      taskLogs {
        severity
        message
        timestamp
        type
      }
    }
  }
}"#;

const PROJECTS: &str = r#"query GetProjects {
  projects {
    groupDisplayName
    projects {
      id
      displayName
      identifier
      enabled
      owner
      repo
      branch
    }
  }
}"#;

pub fn user_patches(user_id: &str, limit: u32) -> Query {
  Query {
    operation: "GetUserRecentPatches",
    document: USER_PATCHES,
    variables: json!({ "userId": user_id, "limit": limit }),
    root_field: "user",
    subject: Some(Subject {
      kind: "user",
      id: user_id.to_string(),
    }),
  }
}

pub fn patch_failed_tasks(patch_id: &str) -> Query {
  Query {
    operation: "GetPatchFailedTasks",
    document: PATCH_FAILED_TASKS,
    variables: json!({ "patchId": patch_id, "limit": FAILED_TASK_FETCH }),
    root_field: "patch",
    subject: Some(Subject {
      kind: "patch",
      id: patch_id.to_string(),
    }),
  }
}

pub fn task_tests(task_id: &str, execution: u32, failed_only: bool, limit: u32) -> Query {
  let mut filter = json!({ "limit": limit, "page": 0 });
  if failed_only {
    filter["statuses"] = json!(FAILED_TEST_STATUSES);
  }

  Query {
    operation: "GetTaskTestResults",
    document: TASK_TESTS,
    variables: json!({ "taskId": task_id, "execution": execution, "testFilterOptions": filter }),
    root_field: "task",
    subject: Some(Subject {
      kind: "task",
      id: task_id.to_string(),
    }),
  }
}

pub fn task_logs(task_id: &str, execution: u32) -> Query {
  Query {
    operation: "GetTaskLogs",
    document: TASK_LOGS,
    variables: json!({ "taskId": task_id, "execution": execution }),
    root_field: "task",
    subject: Some(Subject {
      kind: "task",
      id: task_id.to_string(),
    }),
  }
}

pub fn projects() -> Query {
  Query {
    operation: "GetProjects",
    document: PROJECTS,
    variables: json!({}),
    root_field: "projects",
    subject: None,
  }
}
