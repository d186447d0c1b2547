use std::collections::{HashMap, HashSet};

use crate::models::{LabelResult, Taxonomy};

/// Give every item at least one label per declared category.
///
/// Only applies when more than one category is declared. For each item,
/// a missing category gets a placeholder using its first option, flagged
/// for reasoning backfill. Placeholders are appended after all existing
/// results, grouped by item in first-appearance order. Running it again on
/// its own output adds nothing.
pub fn ensure_category_coverage(mut results: Vec<LabelResult>, taxonomy: &Taxonomy) -> Vec<LabelResult> {
    if taxonomy.len() <= 1 {
        return results;
    }

    let mut item_order: Vec<&str> = Vec::new();
    let mut represented: HashMap<&str, HashSet<String>> = HashMap::new();
    for result in &results {
        let categories = represented.entry(result.item_id.as_str()).or_insert_with(|| {
            item_order.push(result.item_id.as_str());
            HashSet::new()
        });
        categories.insert(result.category().to_lowercase());
    }

    let mut synthesized = Vec::new();
    for item_id in item_order {
        let present = &represented[item_id];
        for category in &taxonomy.categories {
            if present.contains(&category.category_type.to_lowercase()) {
                continue;
            }
            let Some(option) = category.first_option() else {
                continue;
            };
            synthesized.push(LabelResult::placeholder(
                item_id,
                category.label_for(&option.name),
            ));
        }
    }

    if !synthesized.is_empty() {
        tracing::info!(added = synthesized.len(), "Added placeholder labels for uncovered categories");
    }
    results.extend(synthesized);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> Taxonomy {
        Taxonomy::parse(&["Sentiment: Positive | Negative", "Urgency: High | Low"])
    }

    #[test]
    fn appends_missing_category_with_first_option() {
        let results = vec![
            LabelResult::new("item-0", "Sentiment: Negative", 90, "r", None),
            LabelResult::new("item-0", "Urgency: Low", 80, "r", None),
            LabelResult::new("item-1", "Sentiment: Positive", 90, "r", None),
        ];
        let covered = ensure_category_coverage(results, &taxonomy());

        assert_eq!(covered.len(), 4);
        let added = &covered[3];
        assert_eq!(added.item_id, "item-1");
        assert_eq!(added.label, "Urgency: High");
        assert_eq!(added.confidence, 0);
        assert!(added.needs_review);
        assert!(added.needs_reasoning);
    }

    #[test]
    fn originals_keep_their_order() {
        let results = vec![
            LabelResult::new("b", "Sentiment: Positive", 90, "r", None),
            LabelResult::new("a", "Urgency: High", 90, "r", None),
        ];
        let covered = ensure_category_coverage(results.clone(), &taxonomy());
        assert_eq!(&covered[..2], &results[..]);
        assert_eq!(covered[2].item_id, "b");
        assert_eq!(covered[2].label, "Urgency: High");
        assert_eq!(covered[3].item_id, "a");
        assert_eq!(covered[3].label, "Sentiment: Positive");
    }

    #[test]
    fn is_idempotent() {
        let results = vec![LabelResult::new("item-0", "Sentiment: Positive", 90, "r", None)];
        let once = ensure_category_coverage(results, &taxonomy());
        let twice = ensure_category_coverage(once.clone(), &taxonomy());
        assert_eq!(once, twice);
    }

    #[test]
    fn category_match_ignores_case() {
        let results = vec![
            LabelResult::new("item-0", "sentiment: positive", 90, "r", None),
            LabelResult::new("item-0", "URGENCY: Low", 90, "r", None),
        ];
        assert_eq!(ensure_category_coverage(results, &taxonomy()).len(), 2);
    }

    #[test]
    fn single_category_is_left_alone() {
        let single = Taxonomy::parse(&["Sentiment: Positive | Negative"]);
        let results = vec![LabelResult::error_placeholder("item-0", "boom")];
        assert_eq!(ensure_category_coverage(results, &single).len(), 1);
    }

    #[test]
    fn error_results_are_covered_too() {
        let results = vec![LabelResult::error_placeholder("item-0", "boom")];
        let covered = ensure_category_coverage(results, &taxonomy());
        assert_eq!(covered.len(), 3);
        assert!(covered[1..].iter().all(|r| r.needs_reasoning));
    }

    #[test]
    fn categories_without_options_are_skipped() {
        let taxonomy = Taxonomy::parse(&["Sentiment: Positive | Negative", "Topic"]);
        let results = vec![LabelResult::new("item-0", "Sentiment: Positive", 90, "r", None)];
        assert_eq!(ensure_category_coverage(results, &taxonomy).len(), 1);
    }
}
