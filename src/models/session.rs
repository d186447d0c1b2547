use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::data_item::DataItem;
use super::enums::SessionStatus;
use super::label_result::LabelResult;
use super::taxonomy::LabelingIntent;

/// A persisted labeling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelingSession {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: Vec<DataItem>,
    pub intent: LabelingIntent,
    #[serde(default)]
    pub results: Vec<LabelResult>,
    pub status: SessionStatus,
}

/// Index entry: session metadata without data or results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: SessionStatus,
}

fn default_status() -> SessionStatus {
    SessionStatus::InProgress
}

impl LabelingSession {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            status: self.status,
        }
    }
}
