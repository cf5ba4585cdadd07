// storage/mod.rs
// Database operations module

mod commercial_view;
mod coordinates;
mod flights;
mod migrations;
mod pool;
mod runs;
#[cfg(test)]
pub(crate) mod test_helpers;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;
use crate::transform::{CoordinateMap, FlightRecord};

// Re-export commonly used items
pub use commercial_view::{
    build_view_sql, load_airline_codes, parse_airline_codes, quote_literal,
    refresh_commercial_view, COMMERCIAL_VIEW_NAME,
};
pub use coordinates::load_coordinates;
pub use flights::upsert_flights;
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use runs::{
    insert_run_metadata, query_run_history, update_run_stats, RunMetadata, RunStats, RunSummary,
};

/// Persistence seam used by the job runner.
///
/// Implementations must tolerate concurrent calls from several workers;
/// conflicts are resolved by upsert, not by the caller.
#[async_trait]
pub trait FlightStore: Send + Sync {
    /// Persists one page of records under `run_id`, returning the count written.
    async fn upsert_flights(
        &self,
        run_id: &str,
        records: &[FlightRecord],
    ) -> Result<usize, DatabaseError>;

    /// Records the start of a run.
    async fn begin_run(&self, _meta: &RunMetadata<'_>) -> Result<(), DatabaseError> {
        Ok(())
    }

    /// Records the end-of-run statistics.
    async fn finish_run(&self, _stats: &RunStats<'_>) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Best-effort airport coordinate lookup.
#[async_trait]
pub trait CoordinateSource: Send + Sync {
    /// Never fails; problems yield an empty map.
    async fn load_coordinates(&self) -> CoordinateMap;
}

/// SQLite-backed [`FlightStore`] and [`CoordinateSource`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl FlightStore for SqliteStore {
    async fn upsert_flights(
        &self,
        run_id: &str,
        records: &[FlightRecord],
    ) -> Result<usize, DatabaseError> {
        upsert_flights(&self.pool, run_id, records).await
    }

    async fn begin_run(&self, meta: &RunMetadata<'_>) -> Result<(), DatabaseError> {
        insert_run_metadata(&self.pool, meta).await
    }

    async fn finish_run(&self, stats: &RunStats<'_>) -> Result<(), DatabaseError> {
        update_run_stats(&self.pool, stats).await
    }
}

#[async_trait]
impl CoordinateSource for SqliteStore {
    async fn load_coordinates(&self) -> CoordinateMap {
        load_coordinates(&self.pool).await
    }
}
