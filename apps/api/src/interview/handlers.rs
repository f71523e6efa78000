//! Axum route handlers for the Interview API.
//!
//! Each mutating handler takes the session's lock for its whole run. A request
//! that arrives while another one holds the lock is rejected with `SESSION_BUSY`.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::SessionView;
use crate::interview::session::{ResumeUpload, Session};
use crate::state::AppState;

/// Multipart field carrying the resume file.
const RESUME_FIELD: &str = "resume";

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

async fn lock_session(state: &AppState, id: Uuid) -> Result<OwnedMutexGuard<Session>, AppError> {
    let handle = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Interview session {id} not found")))?;

    handle.try_lock_owned().map_err(|_| AppError::SessionBusy)
}

async fn read_resume(multipart: &mut Multipart) -> Result<ResumeUpload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(String::from)
            .ok_or_else(|| AppError::Validation("Resume upload must include a filename".to_string()))?;
        let bytes = field.bytes().await?;

        return Ok(ResumeUpload { filename, bytes });
    }

    Err(AppError::Validation(format!(
        "Missing '{RESUME_FIELD}' file field"
    )))
}

/// POST /api/v1/interviews
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let handle = state.sessions.create().await;
    let view = handle.lock().await.view();
    (StatusCode::CREATED, Json(view))
}

/// GET /api/v1/interviews/:id
///
/// Read-only, so it waits for an in-flight operation instead of reporting
/// `SESSION_BUSY`.
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Interview session {id} not found")))?;

    let view = handle.lock().await.view();
    Ok(Json(view))
}

/// DELETE /api/v1/interviews/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Interview session {id} not found")))
    }
}

/// POST /api/v1/interviews/:id/resume
///
/// Multipart upload (`resume` field, .pdf or .docx). Starts the interview and
/// returns the session with the model's opening question.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let mut session = lock_session(&state, id).await?;
    let upload = read_resume(&mut multipart).await?;

    session
        .upload_resume(state.chat_model.as_ref(), upload)
        .await?;

    Ok(Json(session.view()))
}

/// POST /api/v1/interviews/:id/answers
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = lock_session(&state, id).await?;
    session.submit_answer(&request.answer).await?;
    Ok(Json(session.view()))
}

/// POST /api/v1/interviews/:id/end
///
/// Ends the interview and returns the session with the performance review.
pub async fn handle_end_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = lock_session(&state, id).await?;
    session.end_interview().await?;
    Ok(Json(session.view()))
}

/// POST /api/v1/interviews/:id/feedback
///
/// Repeats a failed feedback request. Returns the stored review otherwise.
pub async fn handle_request_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = lock_session(&state, id).await?;
    session.request_feedback().await?;
    Ok(Json(session.view()))
}

/// POST /api/v1/interviews/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = lock_session(&state, id).await?;
    session.reset();
    Ok(Json(session.view()))
}
