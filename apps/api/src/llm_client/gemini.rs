//! Gemini backend for `ChatModel` / `ChatSession`.
//!
//! Uses the `generateContent` REST endpoint. The API is stateless, so a
//! `GeminiChat` carries the conversation history and replays it on every
//! call; the persona travels as `systemInstruction` on each request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChatError, ChatModel, ChatSession};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";

/// Connection settings for the Gemini API, loaded by `Config::from_env`.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<SecretString>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(String::from),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: &'a Content,
    contents: Vec<&'a Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> Result<String, ChatError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("prompt blocked ({r})"))
                .unwrap_or_else(|| "response contained no candidates".to_string());
            return Err(ChatError::Api {
                status: None,
                message: reason,
            });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ChatError::Api {
                status: None,
                message: format!(
                    "model returned empty content (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            });
        }

        Ok(text)
    }
}

/// Gemini-backed `ChatModel`. Cloned into every conversation it opens.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    model: String,
    endpoint: String,
    system_instruction: Content,
    max_output_tokens: u32,
}

impl GeminiClient {
    /// Configures the client with a fixed persona.
    ///
    /// Fails with `ModelUnavailable` when no API key is configured.
    pub fn new(
        settings: &GeminiSettings,
        system_instruction: &str,
    ) -> Result<Self, ChatError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.expose_secret().trim().is_empty())
            .ok_or_else(|| {
                ChatError::ModelUnavailable(
                    "GEMINI_API_KEY not found. Make sure it's in your .env file.".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ChatError::ModelUnavailable(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: settings.model.clone(),
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                settings.api_base.trim_end_matches('/'),
                settings.model
            ),
            system_instruction: Content::text(None, system_instruction),
            max_output_tokens: settings.max_output_tokens,
        })
    }

    /// Makes one `generateContent` call with the given history.
    async fn generate(&self, contents: Vec<&Content>) -> Result<String, ChatError> {
        let request_body = GenerateContentRequest {
            system_instruction: &self.system_instruction,
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request_body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status.as_u16(), &body);
            warn!("Gemini API returned {}: {}", status, err);
            return Err(err);
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(classify_transport)?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        parsed.into_text()
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn start(&self) -> Result<Box<dyn ChatSession>, ChatError> {
        Ok(Box::new(GeminiChat {
            client: self.clone(),
            history: Vec::new(),
        }))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// One conversation against Gemini.
pub struct GeminiChat {
    client: GeminiClient,
    history: Vec<Content>,
}

#[async_trait]
impl ChatSession for GeminiChat {
    async fn send(&mut self, text: &str) -> Result<String, ChatError> {
        let user = Content::text(Some("user"), text);
        let contents = self
            .history
            .iter()
            .chain(std::iter::once(&user))
            .collect();

        let reply = self.client.generate(contents).await?;

        self.history.push(user);
        self.history.push(Content::text(Some("model"), &reply));
        Ok(reply)
    }

    fn turn_count(&self) -> usize {
        self.history.len() / 2
    }
}

/// Maps a non-2xx response to the adapter's error taxonomy.
fn classify_status(status: u16, body: &str) -> ChatError {
    let message = serde_json::from_str::<GeminiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    if status == 408 || status == 429 || status >= 500 {
        ChatError::Transient {
            status: Some(status),
            message,
        }
    } else {
        ChatError::Api {
            status: Some(status),
            message,
        }
    }
}

fn classify_transport(e: reqwest::Error) -> ChatError {
    let status = e.status().map(|s| s.as_u16());
    if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
        ChatError::Transient {
            status,
            message: e.to_string(),
        }
    } else {
        ChatError::Api {
            status,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn settings(api_base: &str, model: &str) -> GeminiSettings {
        GeminiSettings {
            api_key: Some(SecretString::new("test-key".to_string())),
            model: model.to_string(),
            api_base: api_base.to_string(),
            timeout: Duration::from_secs(5),
            max_output_tokens: 256,
        }
    }

    /// Stand-in for the Gemini endpoint: replies with the number of
    /// `contents` it received. Models named `limited` answer 429.
    async fn fake_generate(
        Path(call): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("x-goog-api-key").map(|v| v.as_bytes()) != Some(b"test-key".as_slice()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "message": "missing key" } })),
            );
        }
        if call.starts_with("limited") {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": { "code": 429, "message": "Resource exhausted" } })),
            );
        }
        let turns = body["contents"].as_array().map(|c| c.len()).unwrap_or(0);
        let persona = body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("");
        (
            StatusCode::OK,
            Json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": format!("turns={turns} persona={persona}") }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 3 }
            })),
        )
    }

    async fn spawn_fake_gemini() -> String {
        let app = Router::new().route("/v1beta/models/:call", post(fake_generate));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_missing_api_key_is_model_unavailable() {
        let mut s = settings(DEFAULT_API_BASE, DEFAULT_MODEL);
        s.api_key = None;
        assert!(matches!(
            GeminiClient::new(&s, "persona"),
            Err(ChatError::ModelUnavailable(_))
        ));

        s.api_key = Some(SecretString::new("   ".to_string()));
        assert!(matches!(
            GeminiClient::new(&s, "persona"),
            Err(ChatError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_endpoint_includes_model() {
        let client =
            GeminiClient::new(&settings("https://example.test/", "gemini-x"), "persona").unwrap();
        assert_eq!(
            client.endpoint,
            "https://example.test/v1beta/models/gemini-x:generateContent"
        );
        assert_eq!(client.model_name(), "gemini-x");
    }

    #[test]
    fn test_classify_status_rate_limit_is_transient() {
        let err = classify_status(429, r#"{"error":{"code":429,"message":"Quota exceeded"}}"#);
        match err {
            ChatError::Transient { status, message } => {
                assert_eq!(status, Some(429));
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("expected transient, got {other:?}"),
        }
        assert!(classify_status(503, "overloaded").is_transient());
    }

    #[test]
    fn test_classify_status_bad_request_is_api_error() {
        let err = classify_status(400, "not json");
        match err {
            ChatError::Api { status, message } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "not json");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn test_response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Tell me "},{"text":"about Kafka."}]},"finishReason":"STOP"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_text().unwrap(), "Tell me about Kafka.");
    }

    #[test]
    fn test_blocked_prompt_is_api_error() {
        let raw = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let err = parsed.into_text().unwrap_err();
        assert!(err.to_string().contains("SAFETY"), "got {err}");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_empty_candidate_is_api_error() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[]},"finishReason":"MAX_TOKENS"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let err = parsed.into_text().unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"), "got {err}");
    }

    #[test]
    fn test_request_shape() {
        let persona = Content::text(None, "be rigorous");
        let user = Content::text(Some("user"), "hello");
        let body = GenerateContentRequest {
            system_instruction: &persona,
            contents: vec![&user],
            generation_config: GenerationConfig {
                max_output_tokens: 64,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be rigorous");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 64);
    }

    #[tokio::test]
    async fn test_chat_replays_history() {
        let base = spawn_fake_gemini().await;
        let client = GeminiClient::new(&settings(&base, "echo"), "interviewer").unwrap();

        let mut chat = client.start().await.unwrap();
        assert_eq!(chat.turn_count(), 0);

        assert_eq!(chat.send("resume").await.unwrap(), "turns=1 persona=interviewer");
        assert_eq!(chat.send("answer").await.unwrap(), "turns=3 persona=interviewer");
        assert_eq!(chat.turn_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_send_leaves_history_untouched() {
        let base = spawn_fake_gemini().await;
        let client = GeminiClient::new(&settings(&base, "limited"), "interviewer").unwrap();

        let mut chat = client.start().await.unwrap();
        let err = chat.send("resume").await.unwrap_err();

        assert!(err.is_transient(), "got {err:?}");
        assert!(err.to_string().contains("Resource exhausted"));
        assert_eq!(chat.turn_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            GeminiClient::new(&settings(&format!("http://{addr}"), "echo"), "interviewer").unwrap();
        let mut chat = client.start().await.unwrap();
        assert!(chat.send("hello").await.unwrap_err().is_transient());
    }
}
