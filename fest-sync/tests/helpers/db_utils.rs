//! Database Test Utilities

use anyhow::Result;
use fest_sync::SqliteStore;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a SQLite store in a fresh temporary folder
///
/// Returns (TempDir, SqliteStore, db path) - TempDir must be kept alive for duration of test
pub async fn create_test_store() -> Result<(TempDir, SqliteStore, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_festsync.db");
    let store = SqliteStore::open(&db_path).await?;
    Ok((temp_dir, store, db_path))
}

/// Open the same database again through a new pool
pub async fn reopen_store(db_path: &PathBuf) -> Result<SqliteStore> {
    Ok(SqliteStore::open(db_path).await?)
}

/// Committed row count of a table, read outside any store transaction
pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;
    Ok(count)
}
