use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{CompletionRequest, InferenceError, LlmClient, LlmProvider};

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockReply>,
    fallback: Option<String>,
    prompts: Vec<String>,
}

/// Mock LLM client for testing.
///
/// Replies are consumed in order from a script; once the script is empty the
/// fallback reply (if any) is returned, otherwise the call fails. Clones
/// share state, so a test can keep one handle and inspect recorded prompts
/// after handing another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    state: Arc<Mutex<MockState>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `response` once the script runs out.
    pub fn always(response: &str) -> Self {
        let mock = Self::new();
        mock.with_state(|s| s.fallback = Some(response.to_string()));
        mock
    }

    pub fn push_response(&self, response: &str) -> &Self {
        self.with_state(|s| s.script.push_back(MockReply::Text(response.to_string())));
        self
    }

    pub fn push_error(&self, message: &str) -> &Self {
        self.with_state(|s| s.script.push_back(MockReply::Fail(message.to_string())));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.with_state(|s| s.prompts.clone())
    }

    pub fn call_count(&self) -> usize {
        self.with_state(|s| s.prompts.len())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl LlmClient for MockLlmClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
        self.with_state(|s| {
            s.prompts.push(request.prompt.clone());
            match s.script.pop_front() {
                Some(MockReply::Text(text)) => Ok(text),
                Some(MockReply::Fail(message)) => Err(InferenceError::HttpClient(message)),
                None => s
                    .fallback
                    .clone()
                    .ok_or_else(|| InferenceError::HttpClient("mock script exhausted".into())),
            }
        })
    }

    fn model(&self) -> &str {
        "mock"
    }
}

impl LlmProvider for MockLlmClient {
    fn connect(&self) -> Result<Box<dyn LlmClient>, InferenceError> {
        Ok(Box::new(self.clone()))
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}
