// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Project discovery from recent patch activity, and the flat project catalogue
// role: normalize/projects
// inputs: `user` subtree (recent patches) or `projects` subtree (groups of projects)
// outputs: ranked ProjectActivity list; flat ProjectRecord list
// invariants:
// - Ranking: patch_count desc, latest_patch_time desc, identifier asc (total order, deterministic)
// - Patches without a project identifier count toward patches_scanned but no project
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::{AdapterError, AdapterResult};
use crate::model::{parse_fragment, PatchSummary, ProjectActivity, ProjectRecord, RawProjectGroup};
use crate::normalize::patches::summarize_patches;
use crate::normalize::{NormalizeCtx, OutputShape};
use crate::upstream::catalog::Bounded;

pub fn rank_projects(patches: &[PatchSummary]) -> Vec<ProjectActivity> {
  let mut by_project: BTreeMap<&str, ProjectActivity> = BTreeMap::new();

  for p in patches {
    let Some(id) = p.project_identifier.as_deref().filter(|s| !s.is_empty()) else {
      continue;
    };
    let entry = by_project.entry(id).or_insert_with(|| ProjectActivity {
      project_identifier: id.to_string(),
      patch_count: 0,
      latest_patch_time: None,
    });
    entry.patch_count += 1;
    if p.create_time > entry.latest_patch_time {
      entry.latest_patch_time = p.create_time.clone();
    }
  }

  let mut ranked: Vec<ProjectActivity> = by_project.into_values().collect();
  ranked.sort_by(|a, b| {
    b.patch_count
      .cmp(&a.patch_count)
      .then_with(|| b.latest_patch_time.cmp(&a.latest_patch_time))
      .then_with(|| a.project_identifier.cmp(&b.project_identifier))
  });
  ranked
}

pub struct ProjectDiscovery {
  pub user_id: String,
  pub max_patches: Bounded,
  pub configured_projects: Vec<String>,
  pub workspace_project: Option<String>,
}

impl OutputShape for ProjectDiscovery {
  fn normalize(&self, root: &Value, _ctx: &NormalizeCtx<'_>) -> AdapterResult<Value> {
    let mut patches = summarize_patches(root)?;
    patches.truncate(self.max_patches.effective as usize);
    let ranked = rank_projects(&patches);

    let hint = match ranked.first() {
      Some(top) => format!(
        "Most active project is '{}'; pass it as project_id to the other tools.",
        top.project_identifier
      ),
      None => "No recent patches found; ask the user for the project identifier.".to_string(),
    };

    Ok(json!({
      "user_id": self.user_id,
      "projects": ranked,
      "total_projects": ranked.len(),
      "patches_scanned": patches.len(),
      "configured_projects": self.configured_projects,
      "workspace_project": self.workspace_project,
      "hint": hint,
    }))
  }

  fn limit(&self) -> Option<Bounded> {
    Some(self.max_patches)
  }
}

pub struct ProjectListing;

impl OutputShape for ProjectListing {
  fn normalize(&self, root: &Value, _ctx: &NormalizeCtx<'_>) -> AdapterResult<Value> {
    let Some(groups) = root.as_array() else {
      return Err(AdapterError::SchemaMismatch("projects: expected a list of groups".into()));
    };

    let mut records: Vec<ProjectRecord> = Vec::new();
    for g in groups {
      let group: RawProjectGroup = parse_fragment("project group", g)?;
      for p in group.projects {
        records.push(ProjectRecord {
          identifier: p.identifier,
          display_name: p.display_name,
          owner: p.owner,
          repo: p.repo,
          branch: p.branch,
          enabled: p.enabled.unwrap_or(false),
          group: group.group_display_name.clone(),
        });
      }
    }

    Ok(json!({
      "projects": records,
      "total_count": records.len(),
      "enabled_count": records.iter().filter(|r| r.enabled).count(),
    }))
  }
}
