//! Wiring of the external collaborators.
//!
//! The server and the CLI both run scans through the same [`Services`]
//! bundle, built from configuration in production and from stubs in tests.

use std::sync::Arc;

use crate::catalog::{BookCatalog, GoogleBooksCatalog};
use crate::config::Config;
use crate::ocr::{create_recognizer, TextRecognizer};
use crate::recommend::Recommender;
use crate::scan::Scanner;
use crate::store::{BookStore, SqliteStore};

/// External collaborators a scan is wired to.
///
/// [`Services::from_config`] builds the production set; tests construct
/// one directly with stub implementations.
#[derive(Clone)]
pub struct Services {
    pub recognizer: Arc<dyn TextRecognizer>,
    pub catalog: Arc<dyn BookCatalog>,
    pub store: Arc<dyn BookStore>,
}

impl Services {
    /// Google Vision (or disabled) OCR, Google Books, and SQLite.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let recognizer: Arc<dyn TextRecognizer> = Arc::from(create_recognizer(&config.ocr)?);
        let catalog: Arc<dyn BookCatalog> = Arc::new(GoogleBooksCatalog::new(&config.catalog)?);
        let store: Arc<dyn BookStore> = Arc::new(SqliteStore::open(config).await?);
        Ok(Self {
            recognizer,
            catalog,
            store,
        })
    }

    /// Assemble the scan pipeline around these services.
    pub fn scanner(&self, config: &Config) -> anyhow::Result<Scanner> {
        let recommender = Recommender::from_config(&config.recommend, self.catalog.clone())?;
        Ok(Scanner::new(
            self.recognizer.clone(),
            self.catalog.clone(),
            self.store.clone(),
            recommender,
            config.scan.min_title_chars,
        ))
    }
}
