use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One message of the interview transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    /// Markdown for assistant turns, verbatim input for user turns.
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(speaker: Speaker, content: impl Into<String>) -> Self {
        Self {
            speaker,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Interview lifecycle. Moves forward only; `reset` returns to `AwaitingResume`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    AwaitingResume,
    InProgress,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::AwaitingResume => f.write_str("AWAITING_RESUME"),
            Phase::InProgress => f.write_str("IN_PROGRESS"),
            Phase::Complete => f.write_str("COMPLETE"),
        }
    }
}

/// Read-only snapshot of a session, rendered by the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: Phase,
    pub resume_filename: Option<String>,
    pub transcript: Vec<Turn>,
    /// Markdown performance review, present once the feedback request succeeded.
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_value(Phase::AwaitingResume).unwrap(),
            "AWAITING_RESUME"
        );
        assert_eq!(Phase::InProgress.to_string(), "IN_PROGRESS");
    }

    #[test]
    fn test_speaker_serializes_lowercase() {
        let turn = Turn::new(Speaker::Assistant, "Tell me about Kafka.");
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["speaker"], "assistant");
        assert_eq!(value["content"], "Tell me about Kafka.");
    }
}
