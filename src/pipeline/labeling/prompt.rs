use crate::models::{DataItem, LabelingIntent, Taxonomy};

pub const LABELING_SYSTEM_PROMPT: &str = r#"
You are a careful data labeling assistant. You assign categorical labels to
short texts using ONLY the label taxonomy you are given.

RULES:
1. Every label MUST be written as "<Category>: <Option>" using a category and
   an option exactly as they appear in the taxonomy.
2. Assign exactly one option per category for every text.
3. Report confidence as an integer from 0 to 100.
4. Give a one or two sentence justification grounded in the text.
5. Output valid JSON only. No commentary before or after the JSON.
"#;

pub const BACKFILL_SYSTEM_PROMPT: &str = r#"
You are a careful data labeling assistant. You explain why existing labels
apply to a text and how confident you are in them. Output valid JSON only.
"#;

/// Render the taxonomy as an indented list the model can follow.
pub fn render_taxonomy(taxonomy: &Taxonomy) -> String {
    let mut out = String::new();
    for category in &taxonomy.categories {
        out.push_str(&format!("- {}\n", category.category_type));
        if !category.guideline.is_empty() {
            out.push_str(&format!("  Guideline: {}\n", category.guideline));
        }
        for option in &category.options {
            if option.description.is_empty() {
                out.push_str(&format!("  * {}\n", option.name));
            } else {
                out.push_str(&format!("  * {} ({})\n", option.name, option.description));
            }
        }
    }
    out
}

fn context_block(intent: &LabelingIntent, taxonomy: &Taxonomy) -> String {
    let description = if intent.dataset_description.trim().is_empty() {
        "(not provided)"
    } else {
        intent.dataset_description.trim()
    };
    let guidelines = if intent.guidelines.trim().is_empty() {
        "(none)"
    } else {
        intent.guidelines.trim()
    };

    format!(
        "Dataset description: {description}\n\nLabel taxonomy:\n{}\nGuidelines: {guidelines}\n",
        render_taxonomy(taxonomy)
    )
}

/// Prompt for labeling one item.
pub fn build_single_prompt(intent: &LabelingIntent, taxonomy: &Taxonomy, item: &DataItem) -> String {
    format!(
        r#"{context}
<text>
{text}
</text>

Label the text above. Respond with a single JSON object:
{{
  "labels": [
    {{
      "label": "Category: Option",
      "confidence": 0-100,
      "reasoning": "why this label applies",
      "uncertainty_explanation": "only when confidence is below 70"
    }}
  ]
}}
Include one entry per category."#,
        context = context_block(intent, taxonomy),
        text = item.text.trim(),
    )
}

/// Prompt for labeling a chunk of items in one call. Items are numbered
/// from 0 and the answer must be an array aligned with that numbering.
pub fn build_batch_prompt(intent: &LabelingIntent, taxonomy: &Taxonomy, items: &[DataItem]) -> String {
    let mut texts = String::new();
    for (index, item) in items.iter().enumerate() {
        texts.push_str(&format!("<text index=\"{index}\">\n{}\n</text>\n", item.text.trim()));
    }

    format!(
        r#"{context}
{texts}
Label each of the {count} texts above. Respond with a JSON array containing
one element per text, in the same order:
[
  {{
    "itemIndex": 0,
    "labels": [
      {{
        "label": "Category: Option",
        "confidence": 0-100,
        "reasoning": "why this label applies",
        "uncertainty_explanation": "only when confidence is below 70"
      }}
    ]
  }}
]
Include one label entry per category for every text."#,
        context = context_block(intent, taxonomy),
        count = items.len(),
    )
}

/// Prompt asking for reasoning and confidence on labels that were added
/// without model input.
pub fn build_backfill_prompt(
    intent: &LabelingIntent,
    taxonomy: &Taxonomy,
    item: &DataItem,
    labels: &[&str],
) -> String {
    let label_lines: String = labels.iter().map(|l| format!("- {l}\n")).collect();

    format!(
        r#"{context}
<text>
{text}
</text>

The following labels were assigned to the text above:
{label_lines}
For each label, explain whether and why it applies, and how confident you
are. Respond with one JSON object keyed by the exact label string:
{{
  "Category: Option": {{
    "reasoning": "why this label applies or does not",
    "confidence": 0-100,
    "uncertainty": "what makes this label uncertain, if anything"
  }}
}}"#,
        context = context_block(intent, taxonomy),
        text = item.text.trim(),
    )
}
