//! Shared test helpers for storage module tests.

#[cfg(test)]
use sqlx::sqlite::SqlitePoolOptions;
#[cfg(test)]
use sqlx::SqlitePool;

#[cfg(test)]
use crate::storage::run_migrations;
#[cfg(test)]
use crate::transform::FlightRecord;

/// Creates a test database pool with migrations applied.
/// Uses a single-connection in-memory database for fast test execution.
#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

#[cfg(test)]
pub fn sample_record(flight_num: &str, sched_dep: i64, dest_iata: &str) -> FlightRecord {
    FlightRecord {
        flight_num: Some(flight_num.to_string()),
        status_detail: Some("Scheduled".to_string()),
        origin_iata: Some("NRT".to_string()),
        dest_iata: Some(dest_iata.to_string()),
        sched_dep: Some(sched_dep),
        ..Default::default()
    }
}

#[cfg(test)]
pub async fn count_flights(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM flights")
        .fetch_one(pool)
        .await
        .expect("count")
}

#[cfg(test)]
pub async fn insert_airport(pool: &SqlitePool, iata: &str, lat: Option<f64>, lng: Option<f64>) {
    sqlx::query("INSERT INTO airports (iata, latitude, longitude) VALUES (?, ?, ?)")
        .bind(iata)
        .bind(lat)
        .bind(lng)
        .execute(pool)
        .await
        .expect("insert airport");
}
