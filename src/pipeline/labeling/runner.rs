use std::time::Instant;

use super::backfill::backfill_reasoning;
use super::coverage::ensure_category_coverage;
use super::orchestrator::BatchLabeler;
use super::{LabelingConfig, LabelingError};
use crate::models::{BatchLabelingResult, DataItem, LabelingIntent, Taxonomy};
use crate::pipeline::inference::LlmClient;

/// Largest batch accepted in one labeling request.
pub const MAX_ITEMS: usize = 100;

/// Small uploads are labeled one item per call, larger ones five at a time.
pub fn recommended_batch_size(item_count: usize) -> usize {
    if item_count <= 5 {
        1
    } else {
        5
    }
}

/// Check request bounds and parse the taxonomy. No inference happens here.
pub fn validate_request(items: &[DataItem], intent: &LabelingIntent) -> Result<Taxonomy, LabelingError> {
    if items.is_empty() {
        return Err(LabelingError::Validation("No data items provided".into()));
    }
    if items.len() > MAX_ITEMS {
        return Err(LabelingError::Validation(format!(
            "Too many items: {} (maximum {MAX_ITEMS})",
            items.len()
        )));
    }
    if intent.label_categories.iter().all(|c| c.trim().is_empty()) {
        return Err(LabelingError::Validation(
            "At least one label category is required".into(),
        ));
    }

    let taxonomy = Taxonomy::from_intent(intent);
    taxonomy.validate()?;
    Ok(taxonomy)
}

/// Run the whole pipeline over `items`.
///
/// Only validation errors are returned; inference failures end up as
/// placeholder results flagged for review.
pub fn run_labeling(
    llm: &dyn LlmClient,
    items: &[DataItem],
    intent: &LabelingIntent,
    config: &LabelingConfig,
) -> Result<BatchLabelingResult, LabelingError> {
    let start = Instant::now();
    let taxonomy = validate_request(items, intent)?;
    let batch_size = config
        .batch_size
        .unwrap_or_else(|| recommended_batch_size(items.len()));

    tracing::info!(
        items = items.len(),
        categories = taxonomy.len(),
        batch_size,
        model = llm.model(),
        "Labeling started"
    );

    let labeler = BatchLabeler::new(llm, intent, &taxonomy, config);
    let outcome = labeler.label_items(items, batch_size);
    tracing::debug!(
        duration_ms = outcome.duration_ms,
        failed_chunks = outcome.failed_chunks,
        "Chunks processed"
    );

    let mut results = ensure_category_coverage(outcome.results, &taxonomy);
    let backfill = backfill_reasoning(llm, intent, &taxonomy, items, &mut results, config);

    let batch = BatchLabelingResult::new(results, items.len(), start.elapsed().as_millis() as u64);
    tracing::info!(
        results = batch.results.len(),
        review_needed = batch.review_needed,
        failed_chunks = outcome.failed_chunks,
        backfilled_items = backfill.items_attempted,
        processing_time_ms = batch.processing_time_ms,
        "Labeling complete"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::REVIEW_THRESHOLD;
    use crate::pipeline::inference::MockLlmClient;

    fn intent(categories: &[&str]) -> LabelingIntent {
        LabelingIntent {
            dataset_description: "Support tickets".into(),
            label_categories: categories.iter().map(|c| c.to_string()).collect(),
            guidelines: String::new(),
        }
    }

    fn items(n: usize) -> Vec<DataItem> {
        DataItem::from_texts((0..n).map(|i| format!("ticket {i}")))
    }

    #[test]
    fn batch_size_rule() {
        assert_eq!(recommended_batch_size(1), 1);
        assert_eq!(recommended_batch_size(5), 1);
        assert_eq!(recommended_batch_size(6), 5);
        assert_eq!(recommended_batch_size(100), 5);
    }

    #[test]
    fn boundary_counts_rejected_without_inference() {
        let mock = MockLlmClient::always(r#"{"label":"Sentiment: Positive"}"#);
        let intent = intent(&["Sentiment: Positive | Negative"]);
        let config = LabelingConfig::default();

        for n in [0, MAX_ITEMS + 1] {
            let err = run_labeling(&mock, &items(n), &intent, &config).unwrap_err();
            assert!(err.is_validation(), "n={n}: {err}");
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn empty_categories_rejected() {
        let err = validate_request(&items(1), &intent(&["  "])).unwrap_err();
        assert!(err.is_validation());
        let err = validate_request(&items(1), &intent(&["Topic"])).unwrap_err();
        assert!(matches!(err, LabelingError::Taxonomy(_)));
    }

    #[test]
    fn three_item_sentiment_scenario() {
        let mock = MockLlmClient::new();
        mock.push_response(r#"{"label":"Sentiment: Positive","confidence":92}"#)
            .push_error("upstream exploded")
            .push_response(r#"{"label":"Sentiment: Negative","confidence":81}"#);

        let result = run_labeling(
            &mock,
            &items(3),
            &intent(&["Sentiment: Positive | Negative"]),
            &LabelingConfig::default(),
        )
        .unwrap();

        assert_eq!(result.total_items, 3);
        assert_eq!(result.results.len(), 3);
        assert!(!result.results[0].needs_review);
        assert!(result.results[1].is_error());
        assert_eq!(result.results[1].confidence, 0);
        assert_eq!(result.review_needed, 1);
        // Single category: no coverage, no backfill.
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn partial_batch_coverage_gets_backfilled() {
        let mock = MockLlmClient::new();
        // Six items: one chunk of five, then one single.
        mock.push_response(
            r#"[{"itemIndex":0,"labels":[{"label":"Sentiment: Negative","confidence":90},{"label":"Urgency: Low","confidence":90}]},
                {"itemIndex":1,"labels":[{"label":"Sentiment: Positive","confidence":90}]},
                {"itemIndex":2,"labels":[{"label":"Sentiment: Positive","confidence":90},{"label":"Urgency: Low","confidence":90}]},
                {"itemIndex":3,"labels":[{"label":"Sentiment: Positive","confidence":90},{"label":"Urgency: Low","confidence":90}]},
                {"itemIndex":4,"labels":[{"label":"Sentiment: Positive","confidence":90},{"label":"Urgency: Low","confidence":90}]}]"#,
        )
        .push_response(
            r#"{"labels":[{"label":"Sentiment: Positive","confidence":95},{"label":"Urgency: High","confidence":50}]}"#,
        )
        .push_response(r#"{"Urgency: High":{"reasoning":"Mentions a deadline","confidence":64}}"#);

        let result = run_labeling(
            &mock,
            &items(6),
            &intent(&["Sentiment: Positive | Negative", "Urgency: High | Low"]),
            &LabelingConfig::default(),
        )
        .unwrap();

        assert_eq!(mock.call_count(), 3);
        assert_eq!(result.results.len(), 12);

        let added = result.results.last().unwrap();
        assert_eq!(added.item_id, "item-1");
        assert_eq!(added.label, "Urgency: High");
        assert_eq!(added.reasoning, "Mentions a deadline");
        assert!(added.needs_review);
        assert!(!added.needs_reasoning);

        let below = result
            .results
            .iter()
            .filter(|r| r.confidence < REVIEW_THRESHOLD)
            .count();
        assert_eq!(result.review_needed, below);
        assert_eq!(result.review_needed, 2);
    }

    /// Script one answer per chunk covering only category `A`. Even items
    /// are confident, odd items fall under the review threshold.
    fn script_category_a(mock: &MockLlmClient, n: usize, batch_size: usize) -> usize {
        let confidence = |i: usize| if i % 2 == 0 { 90 } else { 40 };
        let indices: Vec<usize> = (0..n).collect();
        let chunks = indices.chunks(batch_size);
        let chunk_count = chunks.len();
        for chunk in chunks {
            if let [only] = chunk {
                mock.push_response(&format!(
                    r#"{{"label":"A: Yes","confidence":{},"reasoning":"r"}}"#,
                    confidence(*only)
                ));
            } else {
                let entries: Vec<String> = chunk
                    .iter()
                    .enumerate()
                    .map(|(pos, &i)| {
                        format!(
                            r#"{{"itemIndex":{pos},"label":"A: Yes","confidence":{},"reasoning":"r"}}"#,
                            confidence(i)
                        )
                    })
                    .collect();
                mock.push_response(&format!("[{}]", entries.join(",")));
            }
        }
        chunk_count
    }

    #[test]
    fn coverage_and_review_count_hold_across_sizes() {
        let intent = intent(&["A: Yes | No", "B: Up | Down"]);

        for batch_size in [1, 5] {
            for n in [1, 5, 6, MAX_ITEMS] {
                let mock = MockLlmClient::new();
                let chunk_count = script_category_a(&mock, n, batch_size);
                let config = LabelingConfig {
                    batch_size: Some(batch_size),
                    ..LabelingConfig::default()
                };
                let data = items(n);

                let result = run_labeling(&mock, &data, &intent, &config)
                    .unwrap_or_else(|e| panic!("n={n} b={batch_size}: {e}"));

                assert_eq!(result.total_items, n);
                assert!(result.results.iter().all(|r| !r.is_error()), "n={n} b={batch_size}");
                for item in &data {
                    for category in ["A", "B"] {
                        assert!(
                            result
                                .results
                                .iter()
                                .any(|r| r.item_id == item.id && r.category() == category),
                            "n={n} b={batch_size}: {} missing {category}",
                            item.id
                        );
                    }
                }

                let below = result
                    .results
                    .iter()
                    .filter(|r| r.confidence < REVIEW_THRESHOLD)
                    .count();
                assert_eq!(result.review_needed, below, "n={n} b={batch_size}");
                // Every B label is a fallback; half the A labels are unsure.
                assert_eq!(result.review_needed, n + n / 2, "n={n} b={batch_size}");
                // One call per chunk, then one backfill attempt per item.
                assert_eq!(mock.call_count(), chunk_count + n, "n={n} b={batch_size}");
            }
        }
    }

    #[test]
    fn every_item_category_pair_is_covered() {
        let mock = MockLlmClient::always(r#"{"label":"Sentiment: Positive","confidence":90}"#);
        let result = run_labeling(
            &mock,
            &items(4),
            &intent(&["Sentiment: Positive | Negative", "Urgency: High | Low"]),
            &LabelingConfig::default(),
        )
        .unwrap();

        for item in items(4) {
            for category in ["Sentiment", "Urgency"] {
                assert!(
                    result
                        .results
                        .iter()
                        .any(|r| r.item_id == item.id && r.category() == category),
                    "{} missing {category}",
                    item.id
                );
            }
        }
        // Backfill replies never mention the added labels, so they keep the
        // fallback confidence and stay under review.
        assert_eq!(result.review_needed, 4);
    }
}
