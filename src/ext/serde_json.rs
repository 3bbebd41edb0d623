// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Dotted-path lookup into GraphQL envelopes (`data.patch`, `errors.0.message`) with typed extraction
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper for typed extraction with defaults
// invariants: No panics; missing paths yield None; numeric segments index arrays; JSON null counts as absent for is_present
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;

/// Wrapper around a JSON location to allow typed extraction via a clear second step.
pub struct JsonFetched<'a> {
  inner: Option<&'a serde_json::Value>,
}

impl<'a> JsonFetched<'a> {
  /// Attempt to deserialize the fetched value as `T`.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self.inner.and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  /// Borrow the raw value without cloning.
  pub fn value(&self) -> Option<&'a serde_json::Value> {
    self.inner
  }

  /// True when the path exists and holds something other than `null`.
  pub fn is_present(&self) -> bool {
    matches!(self.inner, Some(v) if !v.is_null())
  }

  pub fn as_array(&self) -> Option<&'a Vec<serde_json::Value>> {
    self.inner.and_then(|v| v.as_array())
  }
}

/// Extension to fetch nested values via dotted paths like "data.patch.versionFull".
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;
}

impl JsonFetch for serde_json::Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      let next = match cur {
        serde_json::Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => cur.get(key),
      };

      match next {
        Some(n) => cur = n,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
