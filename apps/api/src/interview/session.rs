//! Interview Session: the three-phase state machine.
//!
//! Flow: AWAITING_RESUME --upload--> IN_PROGRESS --answer*--> IN_PROGRESS
//!       --end--> COMPLETE (one feedback request) --reset--> AWAITING_RESUME
//!
//! Invariants held after every operation, successful or not:
//! - the chat handle exists iff the phase is IN_PROGRESS or COMPLETE
//! - the transcript is empty iff the phase is AWAITING_RESUME
//!
//! A failed operation never advances the phase. The one visible side effect
//! of a failure is the user turn recorded before a failed answer `send`.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extract::{self, DocumentKind, ExtractionError};
use crate::interview::models::{Phase, SessionView, Speaker, Turn};
use crate::interview::prompts::{seed_prompt, FEEDBACK_PROMPT};
use crate::llm_client::{ChatError, ChatModel, ChatSession};

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Cannot {action} while the interview is {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },

    #[error("Answer cannot be empty")]
    EmptyAnswer,
}

/// An uploaded resume as received from the client.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub bytes: Bytes,
}

pub struct Session {
    id: Uuid,
    phase: Phase,
    transcript: Vec<Turn>,
    feedback: Option<String>,
    resume_filename: Option<String>,
    chat: Option<Box<dyn ChatSession>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            phase: Phase::AwaitingResume,
            transcript: Vec::new(),
            feedback: None,
            resume_filename: None,
            chat: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id(),
            phase: self.phase(),
            resume_filename: self.resume_filename.clone(),
            transcript: self.transcript().to_vec(),
            feedback: self.feedback().map(String::from),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Extracts the resume, opens a conversation and seeds it.
    ///
    /// Returns the model's opening question. On any failure the session is
    /// left in AWAITING_RESUME with no chat handle, so the upload can be retried.
    pub async fn upload_resume(
        &mut self,
        model: &dyn ChatModel,
        upload: ResumeUpload,
    ) -> Result<&Turn, InterviewError> {
        self.expect_phase(Phase::AwaitingResume, "upload a resume")?;
        self.touch();

        let ResumeUpload { filename, bytes } = upload;
        let extension = extract::extension_of(&filename).to_string();
        let kind = DocumentKind::from_extension(&extension)?;

        let resume_text =
            tokio::task::spawn_blocking(move || extract::extract_text(&bytes, &extension))
                .await
                .map_err(|e| ExtractionError::unreadable(kind, e))??;

        info!(
            "Session {}: extracted {} chars from {} resume",
            self.id,
            resume_text.len(),
            kind
        );

        let mut chat = model.start().await?;
        let opening = chat.send(&seed_prompt(&resume_text)).await.map_err(|e| {
            warn!("Session {}: seed request failed: {e}", self.id);
            e
        })?;

        self.chat = Some(chat);
        self.resume_filename = Some(filename);
        self.phase = Phase::InProgress;
        info!(
            "Session {}: interview started with {}",
            self.id,
            model.model_name()
        );

        Ok(self.push_turn(Speaker::Assistant, opening))
    }

    /// Records the candidate's answer and returns the model's next question.
    ///
    /// If the model call fails, the answer stays in the transcript with no
    /// assistant turn after it.
    pub async fn submit_answer(&mut self, answer: &str) -> Result<&Turn, InterviewError> {
        self.expect_phase(Phase::InProgress, "submit an answer")?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(InterviewError::EmptyAnswer);
        }

        let Some(chat) = self.chat.as_mut() else {
            return Err(InterviewError::InvalidPhase {
                action: "submit an answer",
                phase: self.phase,
            });
        };

        self.transcript.push(Turn::new(Speaker::User, answer));
        self.updated_at = Utc::now();

        let reply = chat.send(answer).await.map_err(|e| {
            warn!(
                "Session {}: answer request failed (retryable: {}): {e}",
                self.id,
                e.is_transient()
            );
            e
        })?;

        Ok(self.push_turn(Speaker::Assistant, reply))
    }

    /// Moves to COMPLETE and issues the feedback request.
    ///
    /// The phase change sticks even when the feedback request fails; the
    /// request can then be repeated with `request_feedback`.
    pub async fn end_interview(&mut self) -> Result<&str, InterviewError> {
        self.expect_phase(Phase::InProgress, "end the interview")?;

        self.phase = Phase::Complete;
        self.touch();
        info!(
            "Session {}: interview ended after {} exchanges",
            self.id,
            self.chat.as_ref().map(|c| c.turn_count()).unwrap_or(0)
        );

        self.request_feedback().await
    }

    /// Returns the performance review, asking the model only if it has not
    /// produced one yet for this interview.
    pub async fn request_feedback(&mut self) -> Result<&str, InterviewError> {
        self.expect_phase(Phase::Complete, "request feedback")?;

        if self.feedback.is_none() {
            let Some(chat) = self.chat.as_mut() else {
                return Err(InterviewError::InvalidPhase {
                    action: "request feedback",
                    phase: self.phase,
                });
            };

            let review = chat.send(FEEDBACK_PROMPT).await.map_err(|e| {
                warn!("Session {}: feedback request failed: {e}", self.id);
                e
            })?;

            self.feedback = Some(review);
            self.touch();
        }

        Ok(self.feedback.as_deref().unwrap_or_default())
    }

    /// Discards the interview and returns to AWAITING_RESUME from any phase.
    pub fn reset(&mut self) {
        self.phase = Phase::AwaitingResume;
        self.transcript.clear();
        self.feedback = None;
        self.resume_filename = None;
        self.chat = None;
        self.touch();
        info!("Session {}: reset", self.id);
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), InterviewError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(InterviewError::InvalidPhase {
                action,
                phase: self.phase,
            })
        }
    }

    fn push_turn(&mut self, speaker: Speaker, content: String) -> &Turn {
        self.transcript.push(Turn::new(speaker, content));
        self.touch();
        &self.transcript[self.transcript.len() - 1]
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
