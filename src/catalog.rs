//! Book metadata lookup.
//!
//! Defines the [`BookCatalog`] trait and the Google Books implementation,
//! [`GoogleBooksCatalog`]. The scan pipeline uses [`BookCatalog::lookup`]
//! to enrich each OCR'd title; the remote recommender uses
//! [`BookCatalog::search_subject`] to find more books in a category.
//!
//! # Wire format
//!
//! Both calls hit `GET {base_url}/volumes` with a `q` search term and a
//! `maxResults` bound. Each item's `volumeInfo` is mapped by
//! [`volume_to_record`]; every other field of the response is ignored.
//!
//! An API key is optional. When `GOOGLE_BOOKS_API_KEY` is set it is sent as
//! the `key` query parameter.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::CatalogConfig;
use crate::models::BookRecord;

/// Google Books rejects `maxResults` outside this range.
const MAX_RESULTS_CAP: usize = 40;

/// A searchable source of book metadata.
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Find the best match for a title. `None` means the catalog has no match.
    async fn lookup(&self, title: &str) -> Result<Option<BookRecord>>;

    /// Find up to `max` books filed under `subject`.
    async fn search_subject(&self, subject: &str, max: usize) -> Result<Vec<BookRecord>>;
}

/// [`BookCatalog`] backed by the Google Books `volumes` API.
pub struct GoogleBooksCatalog {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksCatalog {
    /// Build a catalog client from configuration.
    ///
    /// The request timeout is `catalog.timeout_secs`, so a slow provider
    /// cannot stall a scan indefinitely.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_key = std::env::var("GOOGLE_BOOKS_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn query_volumes(&self, q: &str, max_results: usize) -> Result<Value> {
        let max_results = max_results.clamp(1, MAX_RESULTS_CAP).to_string();
        let mut params = vec![("q", q), ("maxResults", max_results.as_str())];
        if let Some(ref key) = self.api_key {
            params.push(("key", key.as_str()));
        }

        let response = self
            .client
            .get(format!("{}/volumes", self.base_url))
            .query(&params)
            .send()
            .await
            .context("Google Books request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Google Books API error {}: {}", status, body_text);
        }

        response
            .json()
            .await
            .context("Invalid Google Books response: body is not JSON")
    }
}

#[async_trait]
impl BookCatalog for GoogleBooksCatalog {
    async fn lookup(&self, title: &str) -> Result<Option<BookRecord>> {
        let json = self.query_volumes(title, 1).await?;
        Ok(parse_volumes(&json)?.into_iter().next())
    }

    async fn search_subject(&self, subject: &str, max: usize) -> Result<Vec<BookRecord>> {
        let json = self.query_volumes(&format!("subject:{}", subject), max).await?;
        let mut books = parse_volumes(&json)?;
        books.truncate(max);
        Ok(books)
    }
}

/// Parse a `volumes` response into book records.
///
/// A missing `items` array means zero results. `items` of any other
/// non-array type is an error.
pub fn parse_volumes(json: &Value) -> Result<Vec<BookRecord>> {
    if !json.is_object() {
        bail!("Invalid Google Books response: expected an object");
    }
    let items = match json.get("items") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => bail!("Invalid Google Books response: items is not an array"),
    };

    Ok(items.iter().filter_map(volume_to_record).collect())
}

/// Map one `volumes` item to a [`BookRecord`].
///
/// Returns `None` when the item has no `volumeInfo` object. Wrongly typed
/// fields are treated as absent.
pub fn volume_to_record(item: &Value) -> Option<BookRecord> {
    let info = item.get("volumeInfo")?.as_object()?;

    let text = |key: &str| info.get(key).and_then(Value::as_str).map(str::to_string);
    let list = |key: &str| {
        info.get(key).and_then(Value::as_array).map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
    };

    Some(BookRecord {
        id: None,
        title: text("title"),
        authors: list("authors"),
        thumbnail: info
            .get("imageLinks")
            .and_then(|links| links.get("thumbnail"))
            .and_then(Value::as_str)
            .map(str::to_string),
        categories: list("categories"),
        description: text("description"),
    })
}
