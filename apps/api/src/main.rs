mod config;
mod errors;
mod extract;
mod interview;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::prompts::INTERVIEWER_SYSTEM;
use crate::interview::store::SessionStore;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

/// How often idle sessions are swept from the store.
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interviewer API v{}", env!("CARGO_PKG_VERSION"));

    // No interview can run without a model: a missing credential stops startup here.
    let chat_model = GeminiClient::new(&config.gemini, INTERVIEWER_SYSTEM)
        .context("Failed to configure AI model")?;
    info!("LLM client initialized (model: {})", config.gemini.model);

    let sessions = SessionStore::new();
    spawn_idle_eviction(sessions.clone(), config.session_idle_timeout);

    let state = AppState {
        chat_model: Arc::new(chat_model),
        sessions,
    };

    let app = build_router(state, config.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drops sessions nobody has touched within `max_idle`.
fn spawn_idle_eviction(sessions: SessionStore, max_idle: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            ticker.tick().await;
            sessions.evict_idle(max_idle).await;
        }
    });
}
