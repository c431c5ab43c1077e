//! Bookmark management for the `shelf bookmarks` commands.

use anyhow::{bail, Result};

use crate::books::join_or_dash;
use crate::config::Config;
use crate::store::{BookStore, SqliteStore};

pub async fn run_list(config: &Config, user_id: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let bookmarks = store.list_bookmarks(user_id).await?;
    store.close().await;

    if bookmarks.is_empty() {
        println!("No bookmarks for {}.", user_id);
        return Ok(());
    }

    for b in &bookmarks {
        println!(
            "{}  {}  {}  ({})",
            b.id,
            b.created_at,
            b.book.title.as_deref().unwrap_or("(untitled)"),
            join_or_dash(b.book.authors.as_deref())
        );
    }
    Ok(())
}

/// Bookmark a previously scanned book by its stored id.
pub async fn run_add(config: &Config, user_id: &str, book_id: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let book = match store.get_book(book_id).await? {
        Some(b) => b,
        None => {
            store.close().await;
            bail!("book not found: {}", book_id);
        }
    };
    let bookmark = store.add_bookmark(user_id, &book).await?;
    store.close().await;

    println!(
        "Bookmarked \"{}\" as {}",
        bookmark.book.title.as_deref().unwrap_or("(untitled)"),
        bookmark.id
    );
    Ok(())
}

pub async fn run_remove(config: &Config, user_id: &str, bookmark_id: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let deleted = store.delete_bookmark(user_id, bookmark_id).await?;
    store.close().await;

    if !deleted {
        bail!("bookmark not found: {}", bookmark_id);
    }
    println!("Removed bookmark {}", bookmark_id);
    Ok(())
}

pub async fn run_clear(config: &Config, user_id: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let count = store.clear_bookmarks(user_id).await?;
    store.close().await;

    println!("Removed {} bookmark(s) for {}", count, user_id);
    Ok(())
}
