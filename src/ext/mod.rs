// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Group extension traits for third-party crates under a single `ext` namespace
// role: module/aggregation
// outputs: Re-exported submodules providing utility traits (JsonFetch for GraphQL envelopes)
// invariants: No side effects; pure extensions only
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod serde_json;
