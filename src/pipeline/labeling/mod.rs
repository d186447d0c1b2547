//! Batch labeling pipeline.
//!
//! ```text
//! validate → taxonomy → orchestrator (chunks) → coverage → backfill → aggregate
//! ```
//!
//! Everything here is synchronous and runs one LLM call at a time. Chunk and
//! backfill failures are recovered locally as placeholder results; only
//! request validation surfaces as an error from [`run_labeling`].

pub mod backfill;
pub mod coverage;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod repair;
pub mod runner;

pub use backfill::{backfill_reasoning, BackfillOutcome};
pub use coverage::ensure_category_coverage;
pub use orchestrator::{BatchLabeler, OrchestrationOutcome};
pub use repair::repair_label;
pub use runner::{recommended_batch_size, run_labeling, validate_request, MAX_ITEMS};

use thiserror::Error;

use crate::models::TaxonomyError;
use crate::pipeline::inference::InferenceError;

#[derive(Error, Debug)]
pub enum LabelingError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid label categories: {0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("LLM error: {0}")]
    Inference(#[from] InferenceError),

    #[error("No JSON found in model response")]
    NoJsonFound,

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Model response contained no usable label")]
    MissingLabel,
}

impl LabelingError {
    /// Caller mistakes, as opposed to failures while labeling.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Taxonomy(_))
    }
}

/// Token budgets and sampling for labeling calls.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelingConfig {
    pub max_tokens: u32,
    pub backfill_max_tokens: u32,
    pub temperature: f32,
    /// Overrides [`recommended_batch_size`] when set.
    pub batch_size: Option<usize>,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            max_tokens: crate::config::DEFAULT_MAX_TOKENS,
            backfill_max_tokens: crate::config::DEFAULT_BACKFILL_MAX_TOKENS,
            temperature: 0.0,
            batch_size: None,
        }
    }
}
