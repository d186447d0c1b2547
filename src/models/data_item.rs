use serde::{Deserialize, Serialize};

/// One unit of uploaded text. `id` is positional (`item-<index>`) when
/// generated by [`DataItem::from_texts`]; callers may also supply their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    pub id: String,
    pub text: String,
}

impl DataItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Build items from raw upload rows, skipping blank lines.
    /// Indices count kept rows only, so ids stay contiguous.
    pub fn from_texts<I, S>(texts: I) -> Vec<DataItem>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        texts
            .into_iter()
            .filter_map(|t| {
                let trimmed = t.as_ref().trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .enumerate()
            .map(|(i, text)| DataItem::new(format!("item-{i}"), text))
            .collect()
    }
}
