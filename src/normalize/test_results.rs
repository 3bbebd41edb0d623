// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Shape one task execution's test results into TestRecord rows with a summary
// role: normalize/test-results
// inputs: `task` subtree with tests {totalTestCount, filteredTestCount, testResults[*]}
// outputs: {task_info, test_results, summary, truncated}
// invariants:
// - Rows keep upstream declaration order; at most `limit` rows are returned
// - failed_tests_in_results counts fail/failed rows case-insensitively, the same rule get-failed-jobs uses
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde_json::{json, Value};

use crate::error::{AdapterError, AdapterResult};
use crate::model::{parse_fragment, RawTask, RawTestResult, TestLogLinks, TestRecord};
use crate::normalize::failed_tasks::is_failed_test_status;
use crate::normalize::{timestamp, truncate, NormalizeCtx, OutputShape};
use crate::upstream::catalog::Bounded;

fn record(r: RawTestResult) -> AdapterResult<TestRecord> {
  Ok(TestRecord {
    start_time: timestamp("test.startTime", r.start_time.as_deref())?,
    end_time: timestamp("test.endTime", r.end_time.as_deref())?,
    test_id: r.id,
    test_file: r.test_file,
    status: r.status,
    duration: r.duration,
    exit_code: r.exit_code,
    group_id: r.group_id.filter(|g| !g.is_empty()),
    logs: r.logs.map(|l| TestLogLinks {
      url: l.url,
      url_parsley: l.url_parsley,
      url_raw: l.url_raw,
      line_num: l.line_num,
      rendering_type: l.rendering_type,
      version: l.version,
    }),
  })
}

pub struct TestListing {
  pub failed_only: bool,
  pub limit: Bounded,
}

impl OutputShape for TestListing {
  fn normalize(&self, root: &Value, _ctx: &NormalizeCtx<'_>) -> AdapterResult<Value> {
    let task: RawTask = parse_fragment("task", root)?;
    let Some(page) = task.tests else {
      return Err(AdapterError::SchemaMismatch("task: `tests` is missing".into()));
    };

    let rows = page
      .test_results
      .into_iter()
      .map(record)
      .collect::<AdapterResult<Vec<_>>>()?;
    let t = truncate(rows, self.limit.effective as usize);

    let failed = t.items.iter().filter(|r| is_failed_test_status(&r.status)).count();
    let filtered_count = page.filtered_test_count.unwrap_or(t.total as u64);

    Ok(json!({
      "task_info": {
        "task_id": task.id,
        "task_name": task.display_name,
        "build_variant": task.build_variant,
        "status": task.status,
        "execution": task.execution.unwrap_or(0),
      },
      "test_results": t.items,
      "summary": {
        "total_test_results": page.total_test_count.unwrap_or(t.total as u64),
        "filtered_test_count": filtered_count,
        "returned_tests": t.items.len(),
        "failed_tests_in_results": failed,
        "filter_applied": if self.failed_only { "failed tests only" } else { "all tests" },
      },
      "truncated": t.truncated || filtered_count > t.items.len() as u64,
    }))
  }

  fn limit(&self) -> Option<Bounded> {
    Some(self.limit)
  }
}
