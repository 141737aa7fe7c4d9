//! Client for the local Ollama generation backend.
//!
//! Generation is consumed through Ollama's non-streaming `/api/chat`
//! endpoint: one request carrying a system and a user message, one JSON
//! response carrying the completion. The backend is a blocking external
//! service, so every call runs under an explicit timeout; expiry surfaces
//! as [`GenerationError::Timeout`], never as a silent failure. No retry is
//! performed here; the caller decides whether to ask again.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default Ollama endpoint for local development.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
/// Default generation model. Keep in sync with what `ollama pull` fetched.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:1b";
/// Default bound on one generation call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Result type for generation calls.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Failures of the generation backend, each kind distinguishable.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationError {
    /// The backend could not be reached, or answered with a non-success
    /// status.
    #[error("generation backend unavailable at {url}: {detail}")]
    BackendUnavailable { url: String, detail: String },

    /// The configured timeout expired before the backend answered.
    #[error("generation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The backend answered, but not in the expected shape.
    #[error("unexpected generation backend response: {detail}")]
    InvalidResponse { detail: String },
}

/// Configuration for the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Model identifier passed with every request.
    pub model: String,
    /// Upper bound on one generation call.
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GenerationConfig {
    /// Defaults, overridden by the `OLLAMA_URL` and `OLLAMA_MODEL`
    /// environment variables when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            config.model = model;
        }
        config
    }

    /// Set the base URL (builder style).
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..self
        }
    }

    /// Set the model identifier (builder style).
    pub fn with_model(self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self
        }
    }

    /// Set the per-call timeout (builder style).
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

// ── Ollama chat API request/response types ─────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Thin client over the Ollama chat endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl OllamaClient {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url.trim_end_matches('/'))
    }

    /// Send one system + user message pair and return the completion text.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let url = self.chat_url();
        let request = ChatRequest {
            model: &self.config.model,
            stream: false,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        tracing::debug!("Calling generation backend at {url} with model {}", self.config.model);

        let call = async {
            let response = self
                .client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| GenerationError::BackendUnavailable {
                    url: url.clone(),
                    detail: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GenerationError::BackendUnavailable {
                    url: url.clone(),
                    detail: format!("HTTP {status}: {body}"),
                });
            }

            let parsed: ChatResponse = response.json().await.map_err(|e| {
                GenerationError::InvalidResponse {
                    detail: e.to_string(),
                }
            })?;
            Ok(parsed.message.content.trim().to_string())
        };

        match tokio::time::timeout(self.config.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout {
                seconds: self.config.timeout.as_secs(),
            }),
        }
    }
}
