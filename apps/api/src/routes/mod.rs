pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/interviews", post(handlers::handle_create_session))
        .route(
            "/api/v1/interviews/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/interviews/:id/resume",
            post(handlers::handle_upload_resume),
        )
        .route(
            "/api/v1/interviews/:id/answers",
            post(handlers::handle_submit_answer),
        )
        .route(
            "/api/v1/interviews/:id/end",
            post(handlers::handle_end_interview),
        )
        .route(
            "/api/v1/interviews/:id/feedback",
            post(handlers::handle_request_feedback),
        )
        .route("/api/v1/interviews/:id/reset", post(handlers::handle_reset))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
