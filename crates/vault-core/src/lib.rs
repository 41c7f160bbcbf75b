//! Service plumbing shared by vault binaries: health checks, request ids,
//! tracing setup, serde helpers and the process-local TTL cache.

pub mod cache;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
