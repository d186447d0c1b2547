//! Human review of labeling results.
//!
//! A correction is authoritative: it carries full confidence and leaves the
//! review queue. Results are addressed by `(item_id, label)` since one item
//! owns one result per category.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{count_review_needed, LabelResult};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("No result for item {item_id} with label {label}")]
    NotFound { item_id: String, label: String },

    #[error("Corrected label must not be empty")]
    EmptyLabel,
}

/// One human edit to an existing result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub item_id: String,
    pub current_label: String,
    pub new_label: String,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// A reviewer accepting one result without changing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acceptance {
    pub item_id: String,
    pub label: String,
}

fn find_index(results: &[LabelResult], item_id: &str, label: &str) -> Result<usize, ReviewError> {
    results
        .iter()
        .position(|r| r.item_id == item_id && r.label == label)
        .ok_or_else(|| ReviewError::NotFound {
            item_id: item_id.to_string(),
            label: label.to_string(),
        })
}

/// Replace a result's label with a human-chosen one.
pub fn apply_correction(results: &mut [LabelResult], correction: &Correction) -> Result<(), ReviewError> {
    let new_label = correction.new_label.trim();
    if new_label.is_empty() {
        return Err(ReviewError::EmptyLabel);
    }
    let index = find_index(results, &correction.item_id, &correction.current_label)?;

    let result = &mut results[index];
    result.label = new_label.to_string();
    result.confidence = 100;
    result.reasoning = match correction.reasoning.as_deref().map(str::trim) {
        Some(reasoning) if !reasoning.is_empty() => reasoning.to_string(),
        _ => "Corrected by reviewer.".to_string(),
    };
    result.uncertainty_explanation = None;
    result.needs_review = false;
    result.needs_reasoning = false;
    Ok(())
}

/// Accept a result as-is.
pub fn mark_reviewed(results: &mut [LabelResult], item_id: &str, label: &str) -> Result<(), ReviewError> {
    let index = find_index(results, item_id, label)?;
    results[index].needs_review = false;
    results[index].needs_reasoning = false;
    Ok(())
}

/// Results still waiting for a reviewer.
pub fn review_needed(results: &[LabelResult]) -> usize {
    count_review_needed(results)
}
