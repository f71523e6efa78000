// Interview Engine
// Implements: the upload → interview → feedback lifecycle, per-client sessions
// and the HTTP handlers that drive them.
// All model calls go through llm_client; no direct API calls here.

pub mod handlers;
pub mod models;
pub mod prompts;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
