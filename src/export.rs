use crate::models::LabelResult;

pub const CSV_HEADER: &str = "ItemId,Label,Confidence,Reasoning,NeedsReview";

/// Quote a string field, doubling embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render results as CSV: one header row, then one row per result.
/// String fields are always quoted; numbers and booleans are bare.
pub fn results_to_csv(results: &[LabelResult]) -> String {
    let mut lines = Vec::with_capacity(results.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for r in results {
        lines.push(format!(
            "{},{},{},{},{}",
            quote(&r.item_id),
            quote(&r.label),
            r.confidence,
            quote(&r.reasoning),
            r.needs_review
        ));
    }
    lines.join("\n")
}

/// File name offered for a session export.
pub fn export_file_name(session_name: &str) -> String {
    let slug: String = session_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "labels.csv".to_string()
    } else {
        format!("{slug}-labels.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split CSV text into records, honouring quoted newlines.
    fn parse_records(csv: &str) -> Vec<Vec<String>> {
        let mut records = Vec::new();
        let mut record = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = csv.chars().peekable();

        while let Some(c) = chars.next() {
            match (c, in_quotes) {
                ('"', true) if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                ('"', _) => in_quotes = !in_quotes,
                (',', false) => record.push(std::mem::take(&mut field)),
                ('\n', false) => {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                _ => field.push(c),
            }
        }
        record.push(field);
        records.push(record);
        records
    }

    fn sample() -> Vec<LabelResult> {
        vec![
            LabelResult::new("item-0", "Sentiment: Positive", 92, "Says \"great\", twice", None),
            LabelResult::new("item-1", "Sentiment: Negative", 40, "Line one\nline two", None),
            LabelResult::error_placeholder("item-2", "timeout"),
        ]
    }

    #[test]
    fn header_and_escaping() {
        let csv = results_to_csv(&sample());
        let first_row = csv.lines().nth(1).unwrap();
        assert_eq!(csv.lines().next().unwrap(), CSV_HEADER);
        assert_eq!(
            first_row,
            r#""item-0","Sentiment: Positive",92,"Says ""great"", twice",false"#
        );
    }

    #[test]
    fn reparsing_reproduces_row_count() {
        let results = sample();
        let records = parse_records(&results_to_csv(&results));
        assert_eq!(records.len(), results.len() + 1);
        assert!(records.iter().all(|r| r.len() == 5));
        assert_eq!(records[1][3], "Says \"great\", twice");
        assert_eq!(records[2][3], "Line one\nline two");
        assert_eq!(records[3][4], "true");
    }

    #[test]
    fn empty_results_is_header_only() {
        assert_eq!(results_to_csv(&[]), CSV_HEADER);
    }

    #[test]
    fn file_name_slug() {
        assert_eq!(export_file_name("Support Tickets (Q3)"), "support-tickets-q3-labels.csv");
        assert_eq!(export_file_name("!!!"), "labels.csv");
    }
}
