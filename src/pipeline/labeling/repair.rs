/// Fix the degenerate `"Option: Option"` label some models emit.
///
/// When the label has exactly two `:`-separated parts that match
/// case-insensitively, the first declared descriptor mentioning that value
/// supplies the real category. Anything else is returned unchanged.
pub fn repair_label<S: AsRef<str>>(label: &str, descriptors: &[S]) -> String {
    let parts: Vec<&str> = label.split(':').collect();
    if parts.len() != 2 {
        return label.to_string();
    }

    let (left, value) = (parts[0].trim(), parts[1].trim());
    if value.is_empty() || !left.eq_ignore_ascii_case(value) {
        return label.to_string();
    }

    let needle = value.to_lowercase();
    let category = descriptors
        .iter()
        .map(|d| d.as_ref())
        .find(|d| d.to_lowercase().contains(&needle))
        .and_then(|d| d.split(':').next())
        .map(str::trim)
        .filter(|c| !c.is_empty());

    match category {
        Some(category) => {
            tracing::debug!(from = label, category, "Repaired echoed label");
            format!("{category}: {value}")
        }
        None => label.to_string(),
    }
}
