//! Shared state and wire types for the HTTP layer.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::db::SqliteKvStore;
use crate::models::{DataItem, LabelResult, LabelingIntent};
use crate::pipeline::inference::LlmProvider;
use crate::pipeline::labeling::LabelingConfig;
use crate::sessions::SessionStore;

pub type SharedStore = Arc<Mutex<SessionStore<SqliteKvStore>>>;

// ═══════════════════════════════════════════════════════════
// API context: shared state for every route
// ═══════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ApiContext {
    pub store: SharedStore,
    pub llm: Arc<dyn LlmProvider>,
    pub labeling: LabelingConfig,
}

impl ApiContext {
    pub fn new(store: SharedStore, llm: Arc<dyn LlmProvider>, labeling: LabelingConfig) -> Self {
        Self { store, llm, labeling }
    }

    /// Lock the session store. Never hold the guard across an `.await`.
    pub fn sessions(&self) -> Result<MutexGuard<'_, SessionStore<SqliteKvStore>>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("Session store lock poisoned".into()))
    }
}

// ═══════════════════════════════════════════════════════════
// Request / response bodies
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    pub data: Vec<DataItem>,
    pub intent: LabelingIntent,
}

#[derive(Debug, Deserialize)]
pub struct CompletionBody {
    pub prompt: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub completion: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub name: String,
    pub data: Vec<DataItem>,
    pub intent: LabelingIntent,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResultsRequest {
    pub results: Vec<LabelResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteSessionRequest {
    #[serde(default)]
    pub results: Option<Vec<LabelResult>>,
}
