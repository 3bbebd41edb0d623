// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Decide which Evergreen project a tool call applies to using a fixed precedence chain
// role: resolution/project
// inputs: explicit project_id argument, process-bound override, workspace path, configured mappings
// outputs: Resolution (resolved with its source, or low-confidence with candidates) and its JSON annotation
// invariants:
// - Precedence: explicit > process override > workspace mapping (longest path prefix) > single configured project
// - Path matching compares whole components, never string prefixes (/src/mongo does not match /src/mongodb)
// - Pure; no filesystem access
// errors: ProjectNotResolved when nothing applies and no candidates exist
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{AdapterError, AdapterResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
  Explicit,
  Environment,
  Workspace,
  SingleConfigured,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
  Resolved { project_id: String, source: ResolutionSource },
  /// Nothing matched the workspace but several projects are configured.
  LowConfidence { candidates: Vec<String> },
}

/// Configured mappings the resolver consults.
#[derive(Debug, Clone, Copy)]
pub struct ProjectSources<'a> {
  pub directory_projects: &'a [(PathBuf, String)],
  pub static_projects: &'a [String],
}

fn given(v: Option<&str>) -> Option<&str> {
  v.map(str::trim).filter(|s| !s.is_empty())
}

/// Project mapped to the deepest configured directory containing `workspace`.
pub fn match_workspace<'a>(workspace: &Path, mappings: &'a [(PathBuf, String)]) -> Option<&'a str> {
  mappings
    .iter()
    .filter(|(dir, _)| workspace.starts_with(dir))
    .max_by_key(|(dir, _)| dir.components().count())
    .map(|(_, project)| project.as_str())
}

pub fn resolve_project(
  explicit: Option<&str>,
  env_override: Option<&str>,
  workspace: &Path,
  sources: &ProjectSources<'_>,
) -> AdapterResult<Resolution> {
  if let Some(p) = given(explicit) {
    return Ok(Resolution::Resolved {
      project_id: p.to_string(),
      source: ResolutionSource::Explicit,
    });
  }

  if let Some(p) = given(env_override) {
    return Ok(Resolution::Resolved {
      project_id: p.to_string(),
      source: ResolutionSource::Environment,
    });
  }

  if let Some(p) = match_workspace(workspace, sources.directory_projects) {
    return Ok(Resolution::Resolved {
      project_id: p.to_string(),
      source: ResolutionSource::Workspace,
    });
  }

  match sources.static_projects {
    [] => Err(AdapterError::ProjectNotResolved),
    [only] => Ok(Resolution::Resolved {
      project_id: only.clone(),
      source: ResolutionSource::SingleConfigured,
    }),
    many => Ok(Resolution::LowConfidence {
      candidates: many.to_vec(),
    }),
  }
}

impl Resolution {
  pub fn project_id(&self) -> Option<&str> {
    match self {
      Resolution::Resolved { project_id, .. } => Some(project_id),
      Resolution::LowConfidence { .. } => None,
    }
  }

  /// Annotation attached to tool outputs so the agent can see how the project was chosen.
  pub fn to_json(&self) -> Value {
    match self {
      Resolution::Resolved { project_id, source } => json!({
        "project_id": project_id,
        "source": source,
        "confidence": "high",
        "candidates": [],
        "warning": null,
      }),
      Resolution::LowConfidence { candidates } => json!({
        "project_id": null,
        "source": null,
        "confidence": "low",
        "candidates": candidates,
        "warning": "Could not detect the project from the workspace; several projects are configured. \
                    Ask the user which one applies, or pass project_id.",
      }),
    }
  }
}
