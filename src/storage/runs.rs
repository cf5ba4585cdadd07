//! Ingest run metadata.
//!
//! This module handles inserting and updating run-level metadata and statistics.

use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;

/// Metadata for an ingest run, recorded at start.
pub struct RunMetadata<'a> {
    pub run_id: &'a str,
    pub region: &'a str,
    pub version: &'a str,
    pub start_time_ms: i64,
}

/// Statistics for a completed ingest run, recorded at end.
pub struct RunStats<'a> {
    pub run_id: &'a str,
    pub total_tasks: i64,
    pub records_upserted: i64,
    pub give_ups: i64,
    pub status: &'a str,
    pub elapsed_seconds: f64,
}

/// Inserts or updates run metadata in the `ingest_runs` table.
pub async fn insert_run_metadata(
    pool: &SqlitePool,
    meta: &RunMetadata<'_>,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO ingest_runs (run_id, region, version, start_time_ms)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(run_id) DO UPDATE SET
             region=excluded.region,
             version=excluded.version,
             start_time_ms=excluded.start_time_ms",
    )
    .bind(meta.run_id)
    .bind(meta.region)
    .bind(meta.version)
    .bind(meta.start_time_ms)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Updates run statistics when a run completes.
pub async fn update_run_stats(
    pool: &SqlitePool,
    stats: &RunStats<'_>,
) -> Result<(), DatabaseError> {
    let end_time_ms = chrono::Utc::now().timestamp_millis();

    sqlx::query(
        "UPDATE ingest_runs
         SET end_time_ms = ?, total_tasks = ?, records_upserted = ?, give_ups = ?,
             status = ?, elapsed_seconds = ?
         WHERE run_id = ?",
    )
    .bind(end_time_ms)
    .bind(stats.total_tasks)
    .bind(stats.records_upserted)
    .bind(stats.give_ups)
    .bind(stats.status)
    .bind(stats.elapsed_seconds)
    .bind(stats.run_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub region: String,
    pub version: String,
    pub start_time_ms: i64,
    pub end_time_ms: Option<i64>,
    pub total_tasks: i64,
    pub records_upserted: i64,
    pub give_ups: i64,
    pub status: Option<String>,
    pub elapsed_seconds: Option<f64>,
}

/// Completed runs, most recent first.
pub async fn query_run_history(
    pool: &SqlitePool,
    limit: Option<usize>,
) -> Result<Vec<RunSummary>, DatabaseError> {
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let rows = sqlx::query(
        "SELECT run_id, region, version, start_time_ms, end_time_ms, total_tasks,
                records_upserted, give_ups, status, elapsed_seconds
         FROM ingest_runs
         WHERE end_time_ms IS NOT NULL
         ORDER BY start_time_ms DESC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    let runs = rows
        .into_iter()
        .map(|row| RunSummary {
            run_id: row.get("run_id"),
            region: row.get("region"),
            version: row.get("version"),
            start_time_ms: row.get("start_time_ms"),
            end_time_ms: row.get("end_time_ms"),
            total_tasks: row.get::<Option<i64>, _>("total_tasks").unwrap_or(0),
            records_upserted: row.get::<Option<i64>, _>("records_upserted").unwrap_or(0),
            give_ups: row.get::<Option<i64>, _>("give_ups").unwrap_or(0),
            status: row.get("status"),
            elapsed_seconds: row.get("elapsed_seconds"),
        })
        .collect();

    Ok(runs)
}
