//! In-memory [`BookStore`] implementation for tests and ephemeral servers.
//!
//! Uses `Vec`s behind `std::sync::RwLock`; insertion order stands in for
//! SQLite's `rowid`.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{BookRecord, Bookmark};

use super::{detached, format_ts_iso, new_id, BookStore};

/// In-memory store. Nothing survives the process.
pub struct InMemoryStore {
    books: RwLock<Vec<BookRecord>>,
    bookmarks: RwLock<Vec<Bookmark>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(Vec::new()),
            bookmarks: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl BookStore for InMemoryStore {
    async fn insert_books(&self, books: &[BookRecord]) -> Result<Vec<String>> {
        let mut stored = self.books.write().map_err(lock_poisoned)?;
        let mut ids = Vec::with_capacity(books.len());
        for book in books {
            let id = new_id();
            stored.push(BookRecord {
                id: Some(id.clone()),
                ..detached(book)
            });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn get_book(&self, id: &str) -> Result<Option<BookRecord>> {
        let stored = self.books.read().map_err(lock_poisoned)?;
        Ok(stored
            .iter()
            .find(|b| b.id.as_deref() == Some(id))
            .cloned())
    }

    async fn list_books(&self, query: Option<&str>, limit: i64) -> Result<Vec<BookRecord>> {
        let needle = query
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        let stored = self.books.read().map_err(lock_poisoned)?;
        Ok(stored
            .iter()
            .rev()
            .filter(|b| match &needle {
                Some(n) => b
                    .title
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(n.as_str())),
                None => true,
            })
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn add_bookmark(&self, user_id: &str, book: &BookRecord) -> Result<Bookmark> {
        let bookmark = Bookmark {
            id: new_id(),
            user_id: user_id.to_string(),
            created_at: format_ts_iso(chrono::Utc::now().timestamp()),
            book: detached(book),
        };
        self.bookmarks
            .write()
            .map_err(lock_poisoned)?
            .push(bookmark.clone());
        Ok(bookmark)
    }

    async fn list_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>> {
        let stored = self.bookmarks.read().map_err(lock_poisoned)?;
        Ok(stored
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_bookmark(&self, user_id: &str, bookmark_id: &str) -> Result<bool> {
        let mut stored = self.bookmarks.write().map_err(lock_poisoned)?;
        let before = stored.len();
        stored.retain(|b| !(b.user_id == user_id && b.id == bookmark_id));
        Ok(stored.len() < before)
    }

    async fn clear_bookmarks(&self, user_id: &str) -> Result<u64> {
        let mut stored = self.bookmarks.write().map_err(lock_poisoned)?;
        let before = stored.len();
        stored.retain(|b| b.user_id != user_id);
        Ok((before - stored.len()) as u64)
    }
}
