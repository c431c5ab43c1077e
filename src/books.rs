//! Stored book listing and retrieval for the `shelf books` commands.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::models::BookRecord;
use crate::store::{BookStore, SqliteStore};

/// CLI entry point for `shelf books list`.
pub async fn run_list(config: &Config, query: Option<&str>, limit: i64) -> Result<()> {
    if limit < 1 {
        bail!("--limit must be >= 1");
    }
    let store = SqliteStore::open(config).await?;
    let books = store.list_books(query, limit).await?;
    store.close().await;

    if books.is_empty() {
        println!("No books found.");
        return Ok(());
    }

    for book in &books {
        println!(
            "{}  {}  [{}]",
            book.id.as_deref().unwrap_or("-"),
            book.title.as_deref().unwrap_or("(untitled)"),
            join_or_dash(book.categories.as_deref())
        );
    }
    println!();
    println!("{} book(s)", books.len());
    Ok(())
}

/// CLI entry point for `shelf books get <id>`.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let book = store.get_book(id).await?;
    store.close().await;

    match book {
        Some(book) => {
            print_book(&book);
            Ok(())
        }
        None => bail!("book not found: {}", id),
    }
}

pub(crate) fn print_book(book: &BookRecord) {
    println!("--- Book ---");
    if let Some(ref id) = book.id {
        println!("id:          {}", id);
    }
    println!(
        "title:       {}",
        book.title.as_deref().unwrap_or("(untitled)")
    );
    println!("authors:     {}", join_or_dash(book.authors.as_deref()));
    println!("categories:  {}", join_or_dash(book.categories.as_deref()));
    if let Some(ref thumb) = book.thumbnail {
        println!("thumbnail:   {}", thumb);
    }
    if let Some(ref desc) = book.description {
        println!();
        println!("{}", desc);
    }
    println!();
}

pub(crate) fn join_or_dash(list: Option<&[String]>) -> String {
    match list {
        Some(items) if !items.is_empty() => items.join(", "),
        _ => "-".to_string(),
    }
}
