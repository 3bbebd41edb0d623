// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Everything that talks to the Evergreen GraphQL endpoint: query templates and the gateway
// role: module/aggregation
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod catalog;
pub mod gateway;

pub use catalog::{Bound, Bounded, Query};
pub use gateway::{api_from_config, interpret_envelope, FixtureGraphqlApi, GraphqlApi, HttpGraphqlApi};
