use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractionError;
use crate::interview::session::InterviewError;
use crate::llm_client::ChatError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant leaves the session as it was before the request, so the
/// client can show the message next to the action and let the user retry.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Another request for this interview is still in progress")]
    SessionBusy,

    #[error("Upload error: {0}")]
    Upload(#[from] MultipartError),

    #[error(transparent)]
    Interview(#[from] InterviewError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::SessionBusy => (StatusCode::CONFLICT, "SESSION_BUSY", self.to_string()),
            AppError::Upload(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "UPLOAD_ERROR",
                "Resume exceeds the upload size limit".to_string(),
            ),
            AppError::Upload(e) => (e.status(), "UPLOAD_ERROR", e.body_text()),
            AppError::Interview(e) => interview_error_parts(e),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn interview_error_parts(err: &InterviewError) -> (StatusCode, &'static str, String) {
    match err {
        InterviewError::Extraction(e) => match e {
            ExtractionError::UnsupportedFormat(_) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                e.to_string(),
            ),
            ExtractionError::EmptyExtraction => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EMPTY_EXTRACTION",
                e.to_string(),
            ),
            ExtractionError::Unreadable { .. } => {
                tracing::warn!("Resume extraction failed: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EXTRACTION_ERROR",
                    e.to_string(),
                )
            }
        },
        InterviewError::Chat(e) => match e {
            ChatError::Transient { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "TRANSIENT_API_ERROR",
                format!("An API error occurred: {e}. Please try again."),
            ),
            ChatError::Api { .. } => (
                StatusCode::BAD_GATEWAY,
                "API_ERROR",
                format!("An API error occurred: {e}"),
            ),
            ChatError::ModelUnavailable(_) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MODEL_UNAVAILABLE",
                    "The interview model is not available".to_string(),
                )
            }
        },
        InterviewError::InvalidPhase { .. } => {
            (StatusCode::CONFLICT, "INVALID_PHASE", err.to_string())
        }
        InterviewError::EmptyAnswer => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
        }
    }
}
