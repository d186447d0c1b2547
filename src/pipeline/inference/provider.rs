use crate::models::LlmBackend;

use super::{HostedClient, InferenceError, LlmClient, OllamaClient};

/// Builds LLM clients on demand.
///
/// Shared by request handlers; `connect` is called on the blocking worker
/// that will drive the returned client.
pub trait LlmProvider: Send + Sync {
    fn connect(&self) -> Result<Box<dyn LlmClient>, InferenceError>;

    fn backend_name(&self) -> &str;
}

/// Backend selection resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceSettings {
    pub backend: LlmBackend,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl LlmProvider for InferenceSettings {
    fn connect(&self) -> Result<Box<dyn LlmClient>, InferenceError> {
        match self.backend {
            LlmBackend::Anthropic => {
                let key = self.api_key.as_deref().ok_or(InferenceError::MissingApiKey)?;
                let client = HostedClient::new(&self.base_url, key, &self.model, self.timeout_secs)?;
                Ok(Box::new(client))
            }
            LlmBackend::Ollama => {
                let client = OllamaClient::new(&self.base_url, &self.model, self.timeout_secs)?;
                Ok(Box::new(client))
            }
        }
    }

    fn backend_name(&self) -> &str {
        self.backend.as_str()
    }
}
