//! Collection envelope.
//!
//! Launchpad wraps result sets in a paginated envelope. A missing
//! `entries` field is a valid empty result, not an error.

use serde::{Deserialize, Serialize};

/// A page of a Launchpad collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection<T> {
    /// Entries on this page. Defaults to empty when the field is absent.
    #[serde(default = "Vec::new")]
    pub entries: Vec<T>,

    /// Total size across all pages, when the API reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,

    /// Link to the next page, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_collection_link: Option<String>,
}

impl<T> Collection<T> {
    /// Reported total size, falling back to the entry count on this page.
    pub fn size(&self) -> u64 {
        self.total_size.unwrap_or(self.entries.len() as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            total_size: None,
            next_collection_link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entries_is_empty() {
        let collection: Collection<String> = serde_json::from_str("{}").unwrap();
        assert!(collection.entries.is_empty());
        assert_eq!(collection.size(), 0);
    }

    #[test]
    fn entries_deserialize() {
        let collection: Collection<String> =
            serde_json::from_str(r#"{"entries": ["a", "b"]}"#).unwrap();
        assert_eq!(collection.entries, vec!["a", "b"]);
        assert_eq!(collection.size(), 2);
    }

    #[test]
    fn total_size_wins_over_entry_count() {
        let collection: Collection<String> =
            serde_json::from_str(r#"{"entries": [], "total_size": 12}"#).unwrap();
        assert_eq!(collection.size(), 12);
        assert!(!collection.is_empty());
    }
}
