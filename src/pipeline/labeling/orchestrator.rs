use std::collections::HashSet;
use std::time::Instant;

use super::parser::{parse_batch_response, parse_single_response, ParsedLabel};
use super::prompt::{build_batch_prompt, build_single_prompt, LABELING_SYSTEM_PROMPT};
use super::repair::repair_label;
use super::{LabelingConfig, LabelingError};
use crate::models::{DataItem, LabelResult, LabelingIntent, Taxonomy, DEFAULT_CONFIDENCE};
use crate::pipeline::inference::{CompletionRequest, LlmClient};

/// Per-chunk labeling over one LLM client.
pub struct BatchLabeler<'a> {
    llm: &'a dyn LlmClient,
    intent: &'a LabelingIntent,
    taxonomy: &'a Taxonomy,
    config: &'a LabelingConfig,
    descriptors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestrationOutcome {
    pub results: Vec<LabelResult>,
    pub failed_chunks: usize,
    pub duration_ms: u64,
}

impl<'a> BatchLabeler<'a> {
    pub fn new(
        llm: &'a dyn LlmClient,
        intent: &'a LabelingIntent,
        taxonomy: &'a Taxonomy,
        config: &'a LabelingConfig,
    ) -> Self {
        Self {
            llm,
            intent,
            taxonomy,
            config,
            descriptors: taxonomy.descriptors(),
        }
    }

    /// Label `items` in consecutive chunks of `batch_size`, one call at a time.
    ///
    /// A failed chunk yields one error placeholder per item and the run
    /// moves on to the next chunk.
    pub fn label_items(&self, items: &[DataItem], batch_size: usize) -> OrchestrationOutcome {
        let start = Instant::now();
        let batch_size = batch_size.max(1);
        let chunk_count = items.len().div_ceil(batch_size);
        let mut results = Vec::with_capacity(items.len() * self.taxonomy.len().max(1));
        let mut failed_chunks = 0;

        for (chunk_index, chunk) in items.chunks(batch_size).enumerate() {
            let outcome = if chunk.len() == 1 {
                self.label_single(&chunk[0])
            } else {
                self.label_batch(chunk)
            };

            match outcome {
                Ok(chunk_results) => {
                    tracing::debug!(
                        chunk = chunk_index + 1,
                        of = chunk_count,
                        labels = chunk_results.len(),
                        "Chunk labeled"
                    );
                    results.extend(chunk_results);
                }
                Err(e) => {
                    failed_chunks += 1;
                    tracing::warn!(
                        chunk = chunk_index + 1,
                        of = chunk_count,
                        items = chunk.len(),
                        error = %e,
                        "Chunk failed, substituting error placeholders"
                    );
                    let message = e.to_string();
                    results.extend(
                        chunk
                            .iter()
                            .map(|item| LabelResult::error_placeholder(&item.id, &message)),
                    );
                }
            }
        }

        OrchestrationOutcome {
            results,
            failed_chunks,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn request(&self, prompt: String) -> CompletionRequest {
        CompletionRequest::new(prompt, self.config.max_tokens)
            .with_system(LABELING_SYSTEM_PROMPT.trim())
            .with_temperature(self.config.temperature)
    }

    fn label_single(&self, item: &DataItem) -> Result<Vec<LabelResult>, LabelingError> {
        let prompt = build_single_prompt(self.intent, self.taxonomy, item);
        let raw = self.llm.complete(&self.request(prompt))?;
        let parsed = parse_single_response(&raw)?;
        Ok(self.build_results(&item.id, parsed))
    }

    fn label_batch(&self, chunk: &[DataItem]) -> Result<Vec<LabelResult>, LabelingError> {
        let prompt = build_batch_prompt(self.intent, self.taxonomy, chunk);
        let raw = self.llm.complete(&self.request(prompt))?;
        let slots = parse_batch_response(&raw, chunk.len())?;

        let mut results = Vec::new();
        for (item, parsed) in chunk.iter().zip(slots) {
            let item_results = self.build_results(&item.id, parsed);
            if item_results.is_empty() {
                tracing::warn!(item_id = %item.id, "Batch response had no label for item");
                results.push(LabelResult::error_placeholder(
                    &item.id,
                    "model response did not include this item",
                ));
            } else {
                results.extend(item_results);
            }
        }
        Ok(results)
    }

    /// Apply repair and defaults, dropping duplicate labels for the item.
    fn build_results(&self, item_id: &str, parsed: Vec<ParsedLabel>) -> Vec<LabelResult> {
        let mut seen = HashSet::new();
        parsed
            .into_iter()
            .filter_map(|p| {
                let label = repair_label(p.label.trim(), &self.descriptors);
                if !seen.insert(label.to_lowercase()) {
                    return None;
                }
                let reasoning = p
                    .reasoning
                    .unwrap_or_else(|| format!("Labeled as {label} based on the text content."));
                let confidence = p.confidence.unwrap_or(DEFAULT_CONFIDENCE);
                Some(LabelResult::new(item_id, label, confidence, reasoning, p.uncertainty))
            })
            .collect()
    }
}
