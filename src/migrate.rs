use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables and indexes. Safe to run repeatedly.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // Scanned books. List fields are JSON arrays; rowid gives insertion order.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            title TEXT,
            authors_json TEXT,
            thumbnail TEXT,
            categories_json TEXT,
            description TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookmarks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT,
            authors_json TEXT,
            thumbnail TEXT,
            categories_json TEXT,
            description TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookmarks_user_id ON bookmarks(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}
