// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Flatten a patch's version/task tree into classified FailedTask records with a summary
// role: normalize/failed-tasks
// inputs: `patch` subtree with versionFull.tasks.data[*] (details, host fields, nested test statuses)
// outputs: {patch_info, version_info, failed_tasks, summary, project_check}
// invariants:
// - Each task carries its version id and build variant; tasks keep upstream declaration order
// - test_info is counted from the nested test results, so failed_test_count <= total_test_count
// - summary counts cover every failed task fetched, not only the returned head
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};

use crate::classify::{classify, ClassifyInput, FailureClass};
use crate::error::AdapterResult;
use crate::model::{parse_fragment, FailedTask, FailureDetails, HostInfo, RawPatch, RawTask, TestInfo, VersionInfo};
use crate::normalize::{timestamp, truncate, LinkBuilder, NormalizeCtx, OutputShape};
use crate::resolve::Resolution;
use crate::upstream::catalog::{Bounded, FAILED_TEST_STATUSES};

pub fn is_failed_test_status(status: &str) -> bool {
  let s = status.trim();
  FAILED_TEST_STATUSES.iter().any(|f| f.eq_ignore_ascii_case(s))
}

pub fn count_tests(task: &RawTask) -> TestInfo {
  let results = task.tests.as_ref().map(|t| t.test_results.as_slice()).unwrap_or(&[]);
  let total = results.len() as u64;
  let failed = results.iter().filter(|r| is_failed_test_status(&r.status)).count() as u64;

  TestInfo {
    has_test_results: total > 0,
    failed_test_count: failed,
    total_test_count: total,
  }
}

pub fn host_info(task: &RawTask) -> HostInfo {
  HostInfo {
    ami: task.ami.clone(),
    host_id: task.host_id.clone(),
    distro_id: task.distro_id.clone(),
    image_id: task.image_id.clone(),
  }
}

fn flatten_task(task: RawTask, version_id: &str, links: &LinkBuilder) -> AdapterResult<FailedTask> {
  let details = task.details.clone().unwrap_or_default();
  let failure_details = FailureDetails {
    description: details.description,
    timed_out: details.timed_out.unwrap_or(false),
    timeout_type: details.timeout_type.filter(|s| !s.is_empty()),
    failing_command: details.failing_command,
  };
  let test_info = count_tests(&task);
  let classification = classify(ClassifyInput {
    status: &task.status,
    timed_out: failure_details.timed_out,
    failed_test_count: test_info.failed_test_count,
  });
  let execution = task.execution.unwrap_or(0);

  Ok(FailedTask {
    finish_time: timestamp("task.finishTime", task.finish_time.as_deref())?,
    host: host_info(&task),
    logs: links.task_links(&task.id, execution),
    task_id: task.id,
    task_name: task.display_name,
    build_variant: task.build_variant,
    version_id: version_id.to_string(),
    status: task.status,
    execution,
    duration_ms: task.time_taken,
    failure_details,
    test_info,
    classification,
    recommendation: classification.recommendation(),
  })
}

fn summarize(tasks: &[FailedTask], upstream_count: Option<u64>, returned: usize) -> Value {
  let mut by_class: BTreeMap<&str, u64> = FailureClass::ALL.iter().map(|c| (c.as_str(), 0)).collect();
  let mut variants: BTreeSet<&str> = BTreeSet::new();

  for t in tasks {
    *by_class.entry(t.classification.as_str()).or_insert(0) += 1;
    if let Some(bv) = t.build_variant.as_deref() {
      variants.insert(bv);
    }
  }

  let total = upstream_count.unwrap_or(0).max(tasks.len() as u64);
  let has_timeouts = tasks
    .iter()
    .any(|t| t.failure_details.timed_out || t.classification == FailureClass::Timeout);

  json!({
    "total_failed_tasks": total,
    "returned_tasks": returned,
    "truncated": (returned as u64) < total,
    "failed_build_variants": variants,
    "has_timeouts": has_timeouts,
    "by_classification": by_class,
  })
}

pub struct FailedJobs {
  pub max_results: Bounded,
  /// Project the call resolved to, if any; compared against the patch's own project.
  pub resolution: Option<Resolution>,
}

impl FailedJobs {
  fn project_check(&self, patch_project: Option<&str>) -> Value {
    let Some(resolution) = &self.resolution else {
      return Value::Null;
    };
    let resolved = resolution.project_id();
    let consistent = match (resolved, patch_project) {
      (Some(r), Some(p)) => Some(r == p),
      _ => None,
    };
    let warning = match consistent {
      Some(false) => Some(format!(
        "Patch belongs to project '{}', not the resolved project '{}'.",
        patch_project.unwrap_or_default(),
        resolved.unwrap_or_default()
      )),
      _ => None,
    };

    json!({
      "resolution": resolution.to_json(),
      "patch_project": patch_project,
      "consistent": consistent,
      "warning": warning,
    })
  }
}

impl OutputShape for FailedJobs {
  fn normalize(&self, root: &Value, ctx: &NormalizeCtx<'_>) -> AdapterResult<Value> {
    let patch: RawPatch = parse_fragment("patch", root)?;

    let patch_info = json!({
      "patch_id": patch.id,
      "patch_number": patch.patch_number,
      "githash": patch.githash,
      "description": patch.description,
      "author": patch.author,
      "author_display_name": patch.author_display_name,
      "status": patch.status,
      "create_time": timestamp("patch.createTime", patch.create_time.as_deref())?,
      "project_identifier": patch.project_identifier,
    });
    let project_check = self.project_check(patch.project_identifier.as_deref());

    let Some(version) = patch.version_full else {
      return Ok(json!({
        "patch_info": patch_info,
        "version_info": null,
        "failed_tasks": [],
        "summary": summarize(&[], None, 0),
        "project_check": project_check,
      }));
    };

    let version_info = VersionInfo {
      version_id: version.id.clone(),
      status: version.status.clone(),
      revision: version.revision.clone(),
      author: version.author.clone(),
      create_time: timestamp("version.createTime", version.create_time.as_deref())?,
    };

    let (raw_tasks, upstream_count) = match version.tasks {
      Some(page) => (page.data, page.count),
      None => (Vec::new(), None),
    };

    let tasks = raw_tasks
      .into_iter()
      .map(|t| flatten_task(t, &version.id, ctx.links))
      .collect::<AdapterResult<Vec<_>>>()?;

    let returned = tasks.len().min(self.max_results.effective as usize);
    let summary = summarize(&tasks, upstream_count, returned);
    let t = truncate(tasks, self.max_results.effective as usize);

    Ok(json!({
      "patch_info": patch_info,
      "version_info": version_info,
      "failed_tasks": t.items,
      "summary": summary,
      "project_check": project_check,
    }))
  }

  fn limit(&self) -> Option<Bounded> {
    Some(self.max_results)
  }
}
