use std::collections::HashMap;

use serde_json::Value;

use super::parser::{extract_json_object, parse_confidence, uncertainty_of};
use super::prompt::{build_backfill_prompt, BACKFILL_SYSTEM_PROMPT};
use super::{LabelingConfig, LabelingError};
use crate::models::{needs_review_for, DataItem, LabelResult, LabelingIntent, Taxonomy, DEFAULT_CONFIDENCE};
use crate::pipeline::inference::{CompletionRequest, LlmClient};

pub const FALLBACK_REASONING: &str = "This label was added because the model did not address this category, \
     and no explanation could be generated. Please review it manually.";

/// Floor applied to a placeholder's confidence when backfill fails.
pub const FALLBACK_MIN_CONFIDENCE: u8 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillOutcome {
    pub items_attempted: usize,
    pub items_failed: usize,
    pub labels_filled: usize,
    pub labels_fallback: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Explanation {
    reasoning: String,
    confidence: u8,
    uncertainty: Option<String>,
}

/// Parse `{ "<label>": {reasoning, confidence?, uncertainty?} | "<reasoning>" }`.
fn parse_explanations(raw: &str) -> Result<HashMap<String, Explanation>, LabelingError> {
    let Value::Object(map) = extract_json_object(raw)? else {
        return Err(LabelingError::JsonParsing("expected a JSON object".into()));
    };

    let mut out = HashMap::new();
    for (label, entry) in map {
        let explanation = match entry {
            Value::String(reasoning) if !reasoning.trim().is_empty() => Explanation {
                reasoning: reasoning.trim().to_string(),
                confidence: DEFAULT_CONFIDENCE,
                uncertainty: None,
            },
            Value::Object(fields) => {
                let Some(reasoning) = fields
                    .get("reasoning")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                else {
                    continue;
                };
                Explanation {
                    reasoning: reasoning.to_string(),
                    confidence: fields
                        .get("confidence")
                        .and_then(parse_confidence)
                        .unwrap_or(DEFAULT_CONFIDENCE),
                    uncertainty: uncertainty_of(&fields),
                }
            }
            _ => continue,
        };
        out.insert(label.trim().to_string(), explanation);
    }
    Ok(out)
}

fn lookup<'m>(explanations: &'m HashMap<String, Explanation>, label: &str) -> Option<&'m Explanation> {
    explanations.get(label.trim()).or_else(|| {
        explanations
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(label.trim()))
            .map(|(_, e)| e)
    })
}

fn apply_fallback(result: &mut LabelResult) {
    result.reasoning = FALLBACK_REASONING.to_string();
    result.confidence = result.confidence.max(FALLBACK_MIN_CONFIDENCE);
    result.needs_review = true;
    result.needs_reasoning = false;
}

fn apply_explanation(result: &mut LabelResult, explanation: &Explanation) {
    result.reasoning = explanation.reasoning.clone();
    result.confidence = explanation.confidence;
    result.uncertainty_explanation = explanation.uncertainty.clone();
    result.needs_review = needs_review_for(explanation.confidence);
    result.needs_reasoning = false;
}

/// Replace placeholder reasoning on every result flagged `needs_reasoning`.
///
/// One LLM call per distinct item, sequentially. Every flagged result ends
/// with the flag cleared, whether the call succeeded or not.
pub fn backfill_reasoning(
    llm: &dyn LlmClient,
    intent: &LabelingIntent,
    taxonomy: &Taxonomy,
    items: &[DataItem],
    results: &mut [LabelResult],
    config: &LabelingConfig,
) -> BackfillOutcome {
    let mut pending: Vec<(String, Vec<usize>)> = Vec::new();
    for (index, result) in results.iter().enumerate() {
        if !result.needs_reasoning {
            continue;
        }
        match pending.iter_mut().find(|(id, _)| *id == result.item_id) {
            Some((_, indices)) => indices.push(index),
            None => pending.push((result.item_id.clone(), vec![index])),
        }
    }

    let mut outcome = BackfillOutcome::default();
    for (item_id, indices) in pending {
        outcome.items_attempted += 1;

        let response = match items.iter().find(|i| i.id == item_id) {
            Some(item) => {
                let labels: Vec<&str> = indices.iter().map(|&i| results[i].label.as_str()).collect();
                let prompt = build_backfill_prompt(intent, taxonomy, item, &labels);
                let request = CompletionRequest::new(prompt, config.backfill_max_tokens)
                    .with_system(BACKFILL_SYSTEM_PROMPT.trim())
                    .with_temperature(config.temperature);
                llm.complete(&request)
                    .map_err(LabelingError::from)
                    .and_then(|raw| parse_explanations(&raw))
            }
            None => Err(LabelingError::Validation(format!("unknown item {item_id}"))),
        };

        match response {
            Ok(explanations) => {
                for &i in &indices {
                    match lookup(&explanations, &results[i].label) {
                        Some(explanation) => {
                            apply_explanation(&mut results[i], explanation);
                            outcome.labels_filled += 1;
                        }
                        None => {
                            apply_fallback(&mut results[i]);
                            outcome.labels_fallback += 1;
                        }
                    }
                }
                tracing::debug!(item_id = %item_id, labels = indices.len(), "Reasoning backfilled");
            }
            Err(e) => {
                outcome.items_failed += 1;
                tracing::warn!(item_id = %item_id, error = %e, "Reasoning backfill failed, using fallback");
                for &i in &indices {
                    apply_fallback(&mut results[i]);
                    outcome.labels_fallback += 1;
                }
            }
        }
    }

    outcome
}
