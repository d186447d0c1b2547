//! Blocking LLM clients used by the labeling pipeline.
//!
//! Clients are synchronous (`reqwest::blocking`). Async callers build and
//! drive them inside `tokio::task::spawn_blocking`, which is why
//! [`LlmProvider::connect`] exists: a provider is cheap to share across
//! handlers, a client is created on the worker thread that uses it.

pub mod hosted;
pub mod mock;
pub mod ollama;
pub mod provider;

pub use hosted::HostedClient;
pub use mock::MockLlmClient;
pub use ollama::OllamaClient;
pub use provider::{InferenceSettings, LlmProvider};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("LLM backend is not reachable at {0}")]
    Connection(String),

    #[error("LLM backend returned error (status {status}): {body}")]
    Backend { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,

    #[error("Unsupported LLM backend: {0}")]
    UnsupportedBackend(String),
}

/// One prompt round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens,
            temperature: 0.0,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Text completion backend.
pub trait LlmClient: Send {
    fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError>;

    fn model(&self) -> &str;
}

/// Map a transport failure the same way for every backend.
pub(crate) fn map_send_error(err: reqwest::Error, base_url: &str, timeout_secs: u64) -> InferenceError {
    if err.is_connect() {
        InferenceError::Connection(base_url.to_string())
    } else if err.is_timeout() {
        InferenceError::Timeout(timeout_secs)
    } else {
        InferenceError::HttpClient(err.to_string())
    }
}

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, InferenceError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| InferenceError::HttpClient(e.to_string()))
}

/// Fail with the status and body when the backend did not answer 2xx.
pub(crate) fn ensure_success(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, InferenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(InferenceError::Backend {
        status: status.as_u16(),
        body,
    })
}
