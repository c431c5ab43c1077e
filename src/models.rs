//! Core data models used throughout Shelf Scanner.
//!
//! These types represent the books, bookmarks, and scan results that flow
//! through the scan pipeline and the HTTP API.

use serde::{Deserialize, Serialize};

/// Metadata for one scanned or recommended book.
///
/// Every field is optional: the catalog may omit any of them, and `id` is
/// only present once the record has been persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<Vec<String>>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
}

impl BookRecord {
    /// Category labels, or an empty slice when the record has none.
    pub fn category_labels(&self) -> &[String] {
        self.categories.as_deref().unwrap_or(&[])
    }

    pub fn has_category(&self, label: &str) -> bool {
        self.category_labels().iter().any(|c| c == label)
    }
}

/// A book saved by a user, independent of the scan that found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub created_at: String, // ISO8601
    #[serde(flatten)]
    pub book: BookRecord,
}

/// Response body of a shelf scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub extracted_titles: Vec<String>,
    pub books_found: Vec<BookRecord>,
    pub recommended: Vec<BookRecord>,
}
