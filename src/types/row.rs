//! Persisted result rows.

use serde::{Deserialize, Serialize};

/// Separator between labels in a bag of words.
pub const LABEL_SEPARATOR: &str = ",";

/// One persisted line of the result table: image id and its labels
/// joined into a bag of words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: String,
    #[serde(default)]
    pub label_bag_of_words: String,
}

impl ResultRow {
    pub fn new(id: impl Into<String>, label_bag_of_words: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label_bag_of_words: label_bag_of_words.into(),
        }
    }

    /// Build a row from an ordered label list. Duplicates are kept.
    pub fn from_labels<S: AsRef<str>>(id: impl Into<String>, labels: &[S]) -> Self {
        Self::new(id, bag_of_words(labels))
    }

    /// Split the bag of words back into tokens.
    ///
    /// An empty bag yields a single empty token.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.label_bag_of_words.split(LABEL_SEPARATOR)
    }
}

/// Join labels with the comma separator, preserving order and duplicates.
pub fn bag_of_words<S: AsRef<str>>(labels: &[S]) -> String {
    labels
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(LABEL_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_keeps_order_and_duplicates() {
        let row = ResultRow::from_labels("cat.jpg", &["cat", "cat", "dog"]);
        assert_eq!(row.label_bag_of_words, "cat,cat,dog");
        assert_eq!(row.tokens().collect::<Vec<_>>(), vec!["cat", "cat", "dog"]);
    }

    #[test]
    fn empty_labels_give_empty_bag_and_one_empty_token() {
        let row = ResultRow::from_labels::<&str>("x.jpg", &[]);
        assert_eq!(row.label_bag_of_words, "");
        assert_eq!(row.tokens().collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn bag_joins_owned_labels() {
        let labels = vec!["art".to_string(), "mural".to_string()];
        assert_eq!(bag_of_words(&labels), "art,mural");
        assert_eq!(bag_of_words(&["solo"]), "solo");
    }
}
