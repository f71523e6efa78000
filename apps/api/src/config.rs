use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;

use crate::llm_client::gemini::{GeminiSettings, DEFAULT_API_BASE, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
///
/// A missing `GEMINI_API_KEY` is not rejected here; it surfaces as
/// `ModelUnavailable` when the model client is built at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiSettings,
    pub max_upload_bytes: usize,
    pub session_idle_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini: GeminiSettings {
                api_key: std::env::var("GEMINI_API_KEY").ok().map(SecretString::new),
                model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
                api_base: env_or("GEMINI_API_BASE", DEFAULT_API_BASE),
                timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 120)?),
                max_output_tokens: parse_env("LLM_MAX_OUTPUT_TOKENS", 2048)?,
            },
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            session_idle_timeout: Duration::from_secs(parse_env(
                "SESSION_IDLE_TIMEOUT_SECS",
                3600,
            )?),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}
