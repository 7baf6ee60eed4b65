//! Ambient service plumbing shared by Quillbox binaries: tracing setup,
//! request-id middleware, health handlers, the JSON response envelope, and
//! serde helpers.

pub mod envelope;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
