//! SQLite connection pool for the shelf database.
//!
//! Every pool runs in WAL mode with a busy timeout, so scan inserts from
//! the server and CLI commands against the same file wait for each other
//! instead of failing with `SQLITE_BUSY`.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::time::Duration;

use crate::config::DbConfig;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (creating if needed) the database at `db.path`.
pub async fn connect(db: &DbConfig) -> Result<SqlitePool> {
    if let Some(parent) = db.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&db.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open shelf database: {}", db.path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connect_creates_nested_directories() {
        let tmp = TempDir::new().unwrap();
        let db = DbConfig {
            path: tmp.path().join("a/b/shelf.sqlite"),
        };

        let pool = connect(&db).await.unwrap();
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        pool.close().await;

        assert!(db.path.exists());
    }

    #[tokio::test]
    async fn test_connect_error_names_path() {
        let tmp = TempDir::new().unwrap();
        // A regular file where the parent directory should be
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let db = DbConfig {
            path: blocker.join("shelf.sqlite"),
        };

        let err = connect(&db).await.unwrap_err();
        assert!(
            format!("{:#}", err).contains("blocker"),
            "unexpected error: {:#}",
            err
        );
    }
}
