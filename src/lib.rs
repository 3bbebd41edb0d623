// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Library root for the Evergreen MCP adapter; the binary and integration tests both build on it
// role: module/aggregation
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod ext;
pub mod model;
pub mod normalize;
pub mod resolve;
pub mod server;
pub mod tools;
pub mod upstream;
pub mod util;

pub use error::{AdapterError, AdapterResult};
