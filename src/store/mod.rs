//! Storage abstraction for scanned books and bookmarks.
//!
//! The [`BookStore`] trait covers every persistence operation the scan
//! pipeline, the HTTP server, and the CLI need, so each can run against
//! SQLite in production and [`InMemoryStore`] in tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{BookRecord, Bookmark};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_books`](BookStore::insert_books) | Persist a batch of scanned books |
/// | [`get_book`](BookStore::get_book) | Fetch one stored book |
/// | [`list_books`](BookStore::list_books) | Newest-first listing with optional title filter |
/// | [`add_bookmark`](BookStore::add_bookmark) | Save a book for a user |
/// | [`list_bookmarks`](BookStore::list_bookmarks) | A user's bookmarks, oldest first |
/// | [`delete_bookmark`](BookStore::delete_bookmark) | Remove one bookmark |
/// | [`clear_bookmarks`](BookStore::clear_bookmarks) | Remove all of a user's bookmarks |
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert books in one batch. Returns the assigned ids in input order.
    ///
    /// Any `id` already present on an input record is ignored.
    async fn insert_books(&self, books: &[BookRecord]) -> Result<Vec<String>>;

    async fn get_book(&self, id: &str) -> Result<Option<BookRecord>>;

    /// List stored books, newest first.
    ///
    /// `query` is a case-insensitive substring match on the title.
    async fn list_books(&self, query: Option<&str>, limit: i64) -> Result<Vec<BookRecord>>;

    /// Save `book` as a bookmark owned by `user_id`.
    async fn add_bookmark(&self, user_id: &str, book: &BookRecord) -> Result<Bookmark>;

    async fn list_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>>;

    /// Returns `false` if no bookmark with that id belongs to `user_id`.
    async fn delete_bookmark(&self, user_id: &str, bookmark_id: &str) -> Result<bool>;

    /// Returns the number of bookmarks removed.
    async fn clear_bookmarks(&self, user_id: &str) -> Result<u64>;
}

pub(crate) fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Strip persistence identity so a record can be stored under a new id.
pub(crate) fn detached(book: &BookRecord) -> BookRecord {
    BookRecord {
        id: None,
        ..book.clone()
    }
}
