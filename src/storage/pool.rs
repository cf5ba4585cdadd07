//! Database connection pool management.
//!
//! This module initializes and configures the SQLite connection pool with:
//! - WAL mode enabled for concurrent access
//! - A busy timeout so concurrent ingest workers wait instead of failing
//! - Automatic database file (and parent directory) creation

use std::path::Path;
use std::time::Duration;

use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

const MAX_CONNECTIONS: u32 = 16;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Initializes a connection pool for the database at `db_path`.
///
/// Creates the file (and its parent directory) if it doesn't exist and
/// enables WAL mode on every connection.
///
/// # Errors
///
/// Returns `DatabaseError::FileCreationError` if the parent directory cannot be
/// created, `DatabaseError::SqlError` if the connection fails.
pub async fn init_db_pool_with_path(db_path: &Path) -> Result<SqlitePool, DatabaseError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            error!("Failed to create database directory: {e}");
            DatabaseError::FileCreationError(e.to_string())
        })?;
    }
    if db_path.exists() {
        info!("Using existing database {}", db_path.display());
    } else {
        info!("Creating database {}", db_path.display());
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            DatabaseError::SqlError(e)
        })?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_creates_file_and_enables_wal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("nested").join("flights.db");
        let pool = init_db_pool_with_path(&db_path).await.expect("pool");
        assert!(db_path.exists());

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .expect("pragma");
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
