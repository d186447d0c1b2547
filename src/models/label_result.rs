use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Results below this confidence always need a human look.
pub const REVIEW_THRESHOLD: u8 = 70;

/// Used when the model omits `confidence`.
pub const DEFAULT_CONFIDENCE: u8 = 75;

/// Label assigned when inference or parsing fails for an item.
pub const ERROR_LABEL: &str = "Error: Needs Manual Review";

/// One `"Category: Option"` label assigned to one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelResult {
    pub item_id: String,
    pub label: String,
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: u8,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty_explanation: Option<String>,
    pub needs_review: bool,
    /// Set on labels synthesized by coverage until real reasoning is filled in.
    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_reasoning: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Accept any JSON number and clamp it into 0..=100.
fn deserialize_confidence<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_confidence(raw))
}

/// Round and clamp a model-reported confidence into 0..=100.
pub fn clamp_confidence(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

pub fn needs_review_for(confidence: u8) -> bool {
    confidence < REVIEW_THRESHOLD
}

impl LabelResult {
    pub fn new(
        item_id: impl Into<String>,
        label: impl Into<String>,
        confidence: u8,
        reasoning: impl Into<String>,
        uncertainty_explanation: Option<String>,
    ) -> Self {
        let confidence = confidence.min(100);
        Self {
            item_id: item_id.into(),
            label: label.into(),
            confidence,
            reasoning: reasoning.into(),
            uncertainty_explanation,
            needs_review: needs_review_for(confidence),
            needs_reasoning: false,
        }
    }

    /// Fallback for an item whose chunk failed.
    pub fn error_placeholder(item_id: impl Into<String>, error: &str) -> Self {
        Self {
            item_id: item_id.into(),
            label: ERROR_LABEL.to_string(),
            confidence: 0,
            reasoning: format!("Labeling failed: {error}"),
            uncertainty_explanation: None,
            needs_review: true,
            needs_reasoning: false,
        }
    }

    /// Synthesized label awaiting reasoning backfill.
    pub fn placeholder(item_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            label: label.into(),
            confidence: 0,
            reasoning: "Label added to cover a category the model did not address.".to_string(),
            uncertainty_explanation: None,
            needs_review: true,
            needs_reasoning: true,
        }
    }

    /// Category type: text before the first `:`, trimmed.
    pub fn category(&self) -> &str {
        match self.label.split_once(':') {
            Some((category, _)) => category.trim(),
            None => self.label.trim(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.label == ERROR_LABEL
    }
}

/// Outcome of one labeling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchLabelingResult {
    pub results: Vec<LabelResult>,
    pub completed_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub total_items: usize,
    pub review_needed: usize,
}

impl BatchLabelingResult {
    pub fn new(results: Vec<LabelResult>, total_items: usize, processing_time_ms: u64) -> Self {
        let review_needed = count_review_needed(&results);
        Self {
            results,
            completed_at: Utc::now(),
            processing_time_ms,
            total_items,
            review_needed,
        }
    }
}

pub fn count_review_needed(results: &[LabelResult]) -> usize {
    results.iter().filter(|r| r.needs_review).count()
}
