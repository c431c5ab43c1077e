//! Shelf scan pipeline.
//!
//! Runs one scan end to end:
//!
//! ```text
//! image ─▶ OCR ─▶ title lines ─▶ catalog lookup (per title) ─▶ store ─▶ recommend
//! ```
//!
//! Used by `POST /api/scan` and the `shelf scan` CLI command. All external
//! collaborators are trait objects, so tests drive the pipeline with stubs.

use std::fmt;
use std::sync::Arc;

use crate::catalog::BookCatalog;
use crate::models::{BookRecord, ScanResponse};
use crate::ocr::TextRecognizer;
use crate::recommend::Recommender;
use crate::store::BookStore;
use crate::titles::extract_titles;

/// Why a scan produced no response.
#[derive(Debug)]
pub enum ScanError {
    /// The upload contained no bytes.
    EmptyImage,
    /// OCR ran but found no text.
    NoText,
    /// The OCR provider failed.
    Ocr(anyhow::Error),
    /// Persistence failed.
    Internal(anyhow::Error),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::EmptyImage => write!(f, "image must not be empty"),
            ScanError::NoText => write!(f, "could not extract text from image"),
            ScanError::Ocr(e) => write!(f, "text recognition failed: {}", e),
            ScanError::Internal(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ScanError {}

/// Bundles the collaborators one scan needs.
#[derive(Clone)]
pub struct Scanner {
    recognizer: Arc<dyn TextRecognizer>,
    catalog: Arc<dyn BookCatalog>,
    store: Arc<dyn BookStore>,
    recommender: Recommender,
    min_title_chars: usize,
}

impl Scanner {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        catalog: Arc<dyn BookCatalog>,
        store: Arc<dyn BookStore>,
        recommender: Recommender,
        min_title_chars: usize,
    ) -> Self {
        Self {
            recognizer,
            catalog,
            store,
            recommender,
            min_title_chars,
        }
    }

    pub fn recommender(&self) -> &Recommender {
        &self.recommender
    }

    /// Scan one shelf image.
    ///
    /// Catalog lookups run one title at a time. A failed lookup is logged
    /// and treated as "no match" so a single bad title cannot sink the scan.
    pub async fn scan(&self, image: &[u8]) -> Result<ScanResponse, ScanError> {
        if image.is_empty() {
            return Err(ScanError::EmptyImage);
        }

        let text = self
            .recognizer
            .recognize(image)
            .await
            .map_err(ScanError::Ocr)?;
        if text.trim().is_empty() {
            return Err(ScanError::NoText);
        }

        let extracted_titles = extract_titles(&text, self.min_title_chars);
        tracing::info!(
            provider = self.recognizer.name(),
            titles = extracted_titles.len(),
            "text recognized"
        );

        let mut books_found = self.lookup_all(&extracted_titles).await;

        if !books_found.is_empty() {
            let ids = self
                .store
                .insert_books(&books_found)
                .await
                .map_err(ScanError::Internal)?;
            for (book, id) in books_found.iter_mut().zip(ids) {
                book.id = Some(id);
            }
        }

        let recommended = self.recommender.recommend(&books_found).await;
        tracing::info!(
            found = books_found.len(),
            recommended = recommended.len(),
            "scan complete"
        );

        Ok(ScanResponse {
            extracted_titles,
            books_found,
            recommended,
        })
    }

    async fn lookup_all(&self, titles: &[String]) -> Vec<BookRecord> {
        let mut books = Vec::new();
        for title in titles {
            match self.catalog.lookup(title).await {
                Ok(Some(book)) => books.push(book),
                Ok(None) => tracing::debug!(title = %title, "no catalog match"),
                Err(e) => tracing::warn!(title = %title, error = %e, "catalog lookup failed"),
            }
        }
        books
    }
}
