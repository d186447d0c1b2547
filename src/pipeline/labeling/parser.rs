//! Typed parsing of model output.
//!
//! The model is asked for JSON but answers in free text, so the start of the
//! first object (or array) is located with a pattern match and exactly one
//! value is deserialized from there. Anything after it is ignored.
//! Field presence is checked explicitly; an entry without a usable label is
//! dropped rather than guessed at.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::LabelingError;
use crate::models::clamp_confidence;

static JSON_OBJECT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{").expect("valid regex"));
static JSON_ARRAY_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[").expect("valid regex"));

/// One label as reported by the model, before defaults and repair.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLabel {
    pub label: String,
    pub confidence: Option<u8>,
    pub reasoning: Option<String>,
    pub uncertainty: Option<String>,
}

impl ParsedLabel {
    fn bare(label: &str) -> Self {
        Self {
            label: label.trim().to_string(),
            confidence: None,
            reasoning: None,
            uncertainty: None,
        }
    }
}

fn first_json_value(raw: &str, start: &Regex) -> Result<Value, LabelingError> {
    let m = start.find(raw).ok_or(LabelingError::NoJsonFound)?;
    serde_json::Deserializer::from_str(&raw[m.start()..])
        .into_iter::<Value>()
        .next()
        .ok_or(LabelingError::NoJsonFound)?
        .map_err(|e| LabelingError::JsonParsing(e.to_string()))
}

/// First JSON object in the raw text.
pub fn extract_json_object(raw: &str) -> Result<Value, LabelingError> {
    first_json_value(raw, &JSON_OBJECT_START)
}

/// First JSON array in the raw text.
pub fn extract_json_array(raw: &str) -> Result<Value, LabelingError> {
    first_json_value(raw, &JSON_ARRAY_START)
}

/// Parse a confidence given as a number or numeric string.
///
/// `"85%"` and `85` both give 85. Values strictly between 0 and 1 are read
/// as fractions (`0.85` gives 85).
pub fn parse_confidence(value: &Value) -> Option<u8> {
    let (raw, percent) = match value {
        Value::Number(n) => (n.as_f64()?, false),
        Value::String(s) => {
            let s = s.trim();
            let (digits, percent) = match s.strip_suffix('%') {
                Some(d) => (d.trim(), true),
                None => (s, false),
            };
            (digits.parse::<f64>().ok()?, percent)
        }
        _ => return None,
    };

    if !raw.is_finite() {
        return None;
    }
    let scaled = if !percent && raw > 0.0 && raw < 1.0 {
        raw * 100.0
    } else {
        raw
    };
    Some(clamp_confidence(scaled))
}

fn non_empty_str(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn uncertainty_of(map: &Map<String, Value>) -> Option<String> {
    non_empty_str(map, &["uncertainty_explanation", "uncertaintyExplanation", "uncertainty"])
}

fn parse_label(value: &Value) -> Option<ParsedLabel> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(ParsedLabel::bare(s)),
        Value::Object(map) => {
            let label = non_empty_str(map, &["label"])?;
            Some(ParsedLabel {
                label,
                confidence: map.get("confidence").and_then(parse_confidence),
                reasoning: non_empty_str(map, &["reasoning"]),
                uncertainty: uncertainty_of(map),
            })
        }
        _ => None,
    }
}

/// Labels from one entry: either `{labels: [...]}` or a single label object.
fn parse_entry(value: &Value) -> Vec<ParsedLabel> {
    if let Some(Value::Array(labels)) = value.get("labels") {
        return labels.iter().filter_map(parse_label).collect();
    }
    parse_label(value).into_iter().collect()
}

fn item_index(value: &Value) -> Option<i64> {
    let raw = value.get("itemIndex").or_else(|| value.get("item_index"))?;
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a single-item response.
pub fn parse_single_response(raw: &str) -> Result<Vec<ParsedLabel>, LabelingError> {
    let value = extract_json_object(raw)?;

    let labels = parse_entry(&value);
    if labels.is_empty() {
        return Err(LabelingError::MissingLabel);
    }
    Ok(labels)
}

/// Parse a batch response into `count` slots aligned with the chunk.
///
/// When every entry carries an `itemIndex` the indices decide placement.
/// They are 0-based, as the prompt asks, unless every index falls in
/// `1..=count` and one of them equals `count`; otherwise entries are placed by position. Slots nothing mapped to stay
/// empty.
pub fn parse_batch_response(raw: &str, count: usize) -> Result<Vec<Vec<ParsedLabel>>, LabelingError> {
    let Value::Array(entries) = extract_json_array(raw)? else {
        return Err(LabelingError::JsonParsing("expected a JSON array".into()));
    };

    let mut slots: Vec<Vec<ParsedLabel>> = vec![Vec::new(); count];
    let indices: Vec<Option<i64>> = entries.iter().map(item_index).collect();

    if !entries.is_empty() && indices.iter().all(Option::is_some) {
        let indices: Vec<i64> = indices.into_iter().flatten().collect();
        let count_i = count as i64;
        let one_based = indices.iter().all(|&i| i >= 1 && i <= count_i)
            && indices.contains(&count_i);
        let offset = if one_based { 1 } else { 0 };

        for (entry, index) in entries.iter().zip(indices) {
            let slot = index - offset;
            if slot < 0 || slot >= count as i64 {
                tracing::warn!(index, count, "Batch entry index out of range, ignoring");
                continue;
            }
            slots[slot as usize].extend(parse_entry(entry));
        }
    } else {
        for (slot, entry) in slots.iter_mut().zip(entries.iter()) {
            slot.extend(parse_entry(entry));
        }
    }

    Ok(slots)
}
