// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Shape a user's recent patches into PatchSummary records, newest first
// role: normalize/patches
// inputs: `user` subtree ({patches: {patches: [...]}}), optional project filter, clamped limit
// outputs: {user_id, project_filter, project_resolution, patches, total_patches, returned_patches, truncated}
// invariants:
// - Ordered by create_time descending; ties keep upstream order; patches without a time sort last
// - The project filter runs before truncation so `limit` counts matching patches
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::cmp::Ordering;

use serde_json::{json, Value};

use crate::error::AdapterResult;
use crate::model::{parse_fragment, PatchSummary, RawPatch, RawPatchPage};
use crate::normalize::{require, timestamp, truncate, NormalizeCtx, OutputShape};
use crate::upstream::catalog::Bounded;

/// Parse `user.patches` into summaries sorted newest first.
pub fn summarize_patches(user: &Value) -> AdapterResult<Vec<PatchSummary>> {
  let page: RawPatchPage = parse_fragment("user.patches", require(user, "patches", "user")?)?;

  let mut out = page
    .patches
    .into_iter()
    .map(summarize)
    .collect::<AdapterResult<Vec<_>>>()?;

  out.sort_by(|a, b| newest_first(a.create_time.as_deref(), b.create_time.as_deref()));
  Ok(out)
}

fn newest_first(a: Option<&str>, b: Option<&str>) -> Ordering {
  // Canonical timestamps share one format, so string order is time order.
  match (a, b) {
    (Some(x), Some(y)) => y.cmp(x),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

fn summarize(p: RawPatch) -> AdapterResult<PatchSummary> {
  let create_time = timestamp("patch.createTime", p.create_time.as_deref())?;
  let (version_id, version_status) = match &p.version_full {
    Some(v) => (Some(v.id.clone()), Some(v.status.clone())),
    None => (None, None),
  };

  Ok(PatchSummary {
    patch_id: p.id,
    patch_number: p.patch_number,
    githash: p.githash,
    description: p.description,
    author: p.author,
    author_display_name: p.author_display_name,
    status: p.status,
    create_time,
    project_identifier: p.project_identifier,
    has_version: version_id.is_some(),
    version_id,
    version_status,
  })
}

pub struct PatchListing {
  pub user_id: String,
  pub project_filter: Option<String>,
  pub project_resolution: Value,
  pub limit: Bounded,
}

impl OutputShape for PatchListing {
  fn normalize(&self, root: &Value, _ctx: &NormalizeCtx<'_>) -> AdapterResult<Value> {
    let mut patches = summarize_patches(root)?;

    if let Some(project) = &self.project_filter {
      patches.retain(|p| p.project_identifier.as_deref() == Some(project.as_str()));
    }

    let t = truncate(patches, self.limit.effective as usize);

    Ok(json!({
      "user_id": self.user_id,
      "project_filter": self.project_filter,
      "project_resolution": self.project_resolution,
      "patches": t.items,
      "total_patches": t.total,
      "returned_patches": t.items.len(),
      "truncated": t.truncated,
    }))
  }

  fn limit(&self) -> Option<Bounded> {
    Some(self.limit)
  }
}
