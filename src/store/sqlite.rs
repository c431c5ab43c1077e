//! SQLite-backed [`BookStore`] implementation.
//!
//! `authors` and `categories` are stored as JSON arrays in `*_json` text
//! columns; `NULL` means the field was absent. Ordering uses the implicit
//! `rowid`, which increases with every insert.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::{BookRecord, Bookmark};

use super::{detached, format_ts_iso, new_id, BookStore};

/// SQLite implementation of the [`BookStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database and make sure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(&config.db).await?;
        migrate::apply_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn encode_list(list: &Option<Vec<String>>) -> Result<Option<String>> {
    list.as_ref()
        .map(|l| serde_json::to_string(l).context("Failed to encode list column"))
        .transpose()
}

fn decode_list(raw: Option<String>) -> Option<Vec<String>> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

fn row_to_book(row: &SqliteRow) -> BookRecord {
    BookRecord {
        id: Some(row.get("id")),
        title: row.get("title"),
        authors: decode_list(row.get("authors_json")),
        thumbnail: row.get("thumbnail"),
        categories: decode_list(row.get("categories_json")),
        description: row.get("description"),
    }
}

fn row_to_bookmark(row: &SqliteRow) -> Bookmark {
    let created_at: i64 = row.get("created_at");
    let mut book = row_to_book(row);
    let id = book.id.take().unwrap_or_default();
    Bookmark {
        id,
        user_id: row.get("user_id"),
        created_at: format_ts_iso(created_at),
        book,
    }
}

/// Escape `%`, `_` and `\` for use in a `LIKE ... ESCAPE '\'` pattern.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl BookStore for SqliteStore {
    async fn insert_books(&self, books: &[BookRecord]) -> Result<Vec<String>> {
        let now = chrono::Utc::now().timestamp();
        let mut ids = Vec::with_capacity(books.len());
        let mut tx = self.pool.begin().await?;

        for book in books {
            let id = new_id();
            sqlx::query(
                r#"
                INSERT INTO books (id, title, authors_json, thumbnail, categories_json,
                                   description, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&book.title)
            .bind(encode_list(&book.authors)?)
            .bind(&book.thumbnail)
            .bind(encode_list(&book.categories)?)
            .bind(&book.description)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            ids.push(id);
        }

        tx.commit().await?;
        Ok(ids)
    }

    async fn get_book(&self, id: &str) -> Result<Option<BookRecord>> {
        let row = sqlx::query(
            "SELECT id, title, authors_json, thumbnail, categories_json, description FROM books WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_book))
    }

    async fn list_books(&self, query: Option<&str>, limit: i64) -> Result<Vec<BookRecord>> {
        let rows = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                sqlx::query(
                    r#"
                    SELECT id, title, authors_json, thumbnail, categories_json, description
                    FROM books
                    WHERE lower(title) LIKE ? ESCAPE '\'
                    ORDER BY rowid DESC
                    LIMIT ?
                    "#,
                )
                .bind(like_pattern(q))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, title, authors_json, thumbnail, categories_json, description
                    FROM books
                    ORDER BY rowid DESC
                    LIMIT ?
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(row_to_book).collect())
    }

    async fn add_bookmark(&self, user_id: &str, book: &BookRecord) -> Result<Bookmark> {
        let id = new_id();
        let now = chrono::Utc::now().timestamp();
        let book = detached(book);

        sqlx::query(
            r#"
            INSERT INTO bookmarks (id, user_id, title, authors_json, thumbnail,
                                   categories_json, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&book.title)
        .bind(encode_list(&book.authors)?)
        .bind(&book.thumbnail)
        .bind(encode_list(&book.categories)?)
        .bind(&book.description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Bookmark {
            id,
            user_id: user_id.to_string(),
            created_at: format_ts_iso(now),
            book,
        })
    }

    async fn list_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, title, authors_json, thumbnail, categories_json,
                   description, created_at
            FROM bookmarks
            WHERE user_id = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_bookmark).collect())
    }

    async fn delete_bookmark(&self, user_id: &str, bookmark_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(bookmark_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_bookmarks(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
