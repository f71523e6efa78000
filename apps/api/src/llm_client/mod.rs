//! LLM Client: the single point of entry for all model calls in the interviewer.
//!
//! ARCHITECTURAL RULE: No other module may call the model API directly.
//! Interview code talks to `ChatModel` / `ChatSession`; the Gemini backend
//! lives in `gemini.rs`.
//!
//! The adapter never retries. Whether a failure is worth repeating is
//! reported through `ChatError::is_transient`, and repeating is up to the caller.
use async_trait::async_trait;
use thiserror::Error;

pub mod gemini;

pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The model could not be configured (missing credential, bad client setup).
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Rate limits, 5xx responses, timeouts and connection faults.
    #[error("Temporary model API failure{}: {message}", fmt_status(.status))]
    Transient {
        status: Option<u16>,
        message: String,
    },

    /// Non-retryable faults: invalid requests, blocked prompts, undecodable replies.
    #[error("Model API error{}: {message}", fmt_status(.status))]
    Api {
        status: Option<u16>,
        message: String,
    },
}

impl ChatError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ChatError::Transient { .. })
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// A configured model that can open conversations.
///
/// Carried in `AppState` as `Arc<dyn ChatModel>`. The persona (system
/// instruction) is fixed when the implementation is constructed.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Opens a new conversation. No message is exchanged yet.
    async fn start(&self) -> Result<Box<dyn ChatSession>, ChatError>;

    fn model_name(&self) -> &str;
}

/// A live conversation. The handle keeps the exchanged history for its
/// lifetime; callers only ever see the latest reply.
#[async_trait]
pub trait ChatSession: Send {
    /// Sends `text` as the next user turn and waits for the model's reply.
    /// History is only extended when the exchange succeeds.
    async fn send(&mut self, text: &str) -> Result<String, ChatError>;

    /// Number of completed user/model exchanges held by the conversation.
    fn turn_count(&self) -> usize;
}
