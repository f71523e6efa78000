use std::sync::Arc;

use crate::interview::store::SessionStore;
use crate::llm_client::ChatModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Configured once at startup with the interviewer persona.
    pub chat_model: Arc<dyn ChatModel>,
    pub sessions: SessionStore,
}
