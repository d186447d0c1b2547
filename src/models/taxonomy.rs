//! Labeling intent and the taxonomy parsed from it.
//!
//! Categories arrive as descriptor strings written by the user:
//! `"Urgency: High (outage) | Low -- pick High only when users are blocked"`.
//! The type precedes the first `:`, options are `|`-separated (`,` when no
//! `|` is present), an option may carry a parenthesised description, and an
//! optional guideline follows ` -- `.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the user asked for: a dataset description, category descriptors,
/// and free-text guidelines.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelingIntent {
    #[serde(default)]
    pub dataset_description: String,
    pub label_categories: Vec<String>,
    #[serde(default)]
    pub guidelines: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOption {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCategory {
    #[serde(rename = "type")]
    pub category_type: String,
    #[serde(default)]
    pub guideline: String,
    pub options: Vec<LabelOption>,
    /// The descriptor exactly as the user wrote it.
    #[serde(default)]
    pub descriptor: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("At least one label category is required")]
    NoCategories,

    #[error("Label categories must declare at least one option (e.g. \"Sentiment: Positive | Negative\")")]
    NoOptions,
}

/// Parsed set of categories, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<LabelCategory>,
}

impl LabelOption {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if raw.ends_with(')') {
            if let Some(open) = raw.rfind('(') {
                let name = raw[..open].trim();
                if !name.is_empty() {
                    return Some(Self {
                        name: name.to_string(),
                        description: raw[open + 1..raw.len() - 1].trim().to_string(),
                    });
                }
            }
        }

        Some(Self {
            name: raw.to_string(),
            description: String::new(),
        })
    }
}

impl LabelCategory {
    /// Parse one descriptor. Never fails: a descriptor without `:` becomes
    /// a category with no options, which validation rejects if nothing
    /// else declares options.
    pub fn parse(descriptor: &str) -> Self {
        let raw = descriptor.trim();
        let (body, guideline) = match raw.split_once(" -- ") {
            Some((body, guideline)) => (body.trim(), guideline.trim().to_string()),
            None => (raw, String::new()),
        };

        let Some((category_type, options_text)) = body.split_once(':') else {
            return Self {
                category_type: body.to_string(),
                guideline,
                options: Vec::new(),
                descriptor: raw.to_string(),
            };
        };

        let separator = if options_text.contains('|') { '|' } else { ',' };
        let options = options_text
            .split(separator)
            .filter_map(LabelOption::parse)
            .collect();

        Self {
            category_type: category_type.trim().to_string(),
            guideline,
            options,
            descriptor: raw.to_string(),
        }
    }

    pub fn first_option(&self) -> Option<&LabelOption> {
        self.options.first()
    }

    /// `"<type>: <option>"` for the given option name.
    pub fn label_for(&self, option: &str) -> String {
        format!("{}: {}", self.category_type, option)
    }
}

impl Taxonomy {
    pub fn parse<S: AsRef<str>>(descriptors: &[S]) -> Self {
        let categories = descriptors
            .iter()
            .map(|d| d.as_ref())
            .filter(|d| !d.trim().is_empty())
            .map(LabelCategory::parse)
            .collect();
        Self { categories }
    }

    pub fn from_intent(intent: &LabelingIntent) -> Self {
        Self::parse(&intent.label_categories)
    }

    /// Require at least one category and at least one option overall.
    pub fn validate(&self) -> Result<(), TaxonomyError> {
        if self.categories.is_empty() {
            return Err(TaxonomyError::NoCategories);
        }
        if self.categories.iter().all(|c| c.options.is_empty()) {
            return Err(TaxonomyError::NoOptions);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn descriptors(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.descriptor.clone()).collect()
    }
}
