// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Shared normalizer contract: one OutputShape per tool, plus truncation, timestamps, and the meta block
// role: normalize/core
// inputs: the `data.<root>` subtree returned by the gateway; NormalizeCtx (links, clock)
// outputs: one JSON object per tool call with a `meta` block appended
// invariants:
// - truncate keeps the head of the list; truncated == (total > limit); total is the untruncated size
// - Timestamps leave here in canonical RFC3339 UTC or as null; unparseable input is SchemaMismatch
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod failed_tasks;
pub mod links;
pub mod logs;
pub mod patches;
pub mod projects;
pub mod test_results;

use serde_json::{json, Value};

use crate::error::{AdapterError, AdapterResult};
use crate::ext::serde_json::JsonFetch;
use crate::upstream::catalog::Bounded;
use crate::util::{self, Clock};

pub use links::LinkBuilder;

/// Everything a shape needs besides the upstream reply.
pub struct NormalizeCtx<'a> {
  pub links: &'a LinkBuilder,
  pub clock: &'a dyn Clock,
}

/// A tool's declared output: how to turn one upstream root value into the tool's JSON.
pub trait OutputShape {
  fn normalize(&self, root: &Value, ctx: &NormalizeCtx<'_>) -> AdapterResult<Value>;

  /// The clamped limit this call used, echoed in `meta.limit`.
  fn limit(&self) -> Option<Bounded> {
    None
  }
}

/// Normalize and stamp the `meta` block.
pub fn shape_output(shape: &dyn OutputShape, root: &Value, ctx: &NormalizeCtx<'_>) -> AdapterResult<Value> {
  let mut out = shape.normalize(root, ctx)?;
  if let Some(obj) = out.as_object_mut() {
    obj.insert("meta".to_string(), meta(ctx.clock, shape.limit()));
  }
  Ok(out)
}

pub fn meta(clock: &dyn Clock, limit: Option<Bounded>) -> Value {
  json!({
    "generated_at": util::format_timestamp(clock.now()),
    "limit": limit,
  })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Truncated<T> {
  pub items: Vec<T>,
  pub total: usize,
  pub truncated: bool,
}

pub fn truncate<T>(mut items: Vec<T>, limit: usize) -> Truncated<T> {
  let total = items.len();
  let truncated = total > limit;
  items.truncate(limit);
  Truncated {
    items,
    total,
    truncated,
  }
}

/// Canonical form of an optional upstream timestamp. Empty strings count as absent.
pub fn timestamp(field: &str, raw: Option<&str>) -> AdapterResult<Option<String>> {
  match raw.map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(None),
    Some(s) => util::canonical_timestamp(s)
      .map(Some)
      .ok_or_else(|| AdapterError::SchemaMismatch(format!("{} is not a timestamp: {:?}", field, s))),
  }
}

/// Borrow a required subtree, or fail with SchemaMismatch naming the path.
pub fn require<'a>(root: &'a Value, path: &str, fragment: &str) -> AdapterResult<&'a Value> {
  match root.fetch(path).value() {
    Some(v) if !v.is_null() => Ok(v),
    _ => Err(AdapterError::SchemaMismatch(format!("{}: `{}` is missing", fragment, path))),
  }
}
