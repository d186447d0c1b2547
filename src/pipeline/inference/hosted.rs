use serde::{Deserialize, Serialize};

use super::{build_http_client, ensure_success, map_send_error, CompletionRequest, InferenceError, LlmClient};

pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the hosted Messages API.
pub struct HostedClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HostedClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, InferenceError> {
        if api_key.trim().is_empty() {
            return Err(InferenceError::MissingApiKey);
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            client: build_http_client(timeout_secs)?,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Join the text blocks of a response; no text at all is malformed.
fn collect_text(response: MessagesResponse) -> Result<String, InferenceError> {
    let text: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(InferenceError::MalformedResponse(
            "response contained no text content".into(),
        ));
    }
    Ok(text.join(""))
}

impl LlmClient for HostedClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.as_str())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_secs))?;

        let parsed: MessagesResponse = ensure_success(response)?
            .json()
            .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;

        collect_text(parsed)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
