//! Flight record upserts.

use log::debug;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;
use crate::transform::FlightRecord;
use crate::utils::{timed, PerfSpan};

const UPSERT_FLIGHT_SQL: &str = "INSERT INTO flights (
        ingest_run_id, flight_key, flight_num, status_detail,
        aircraft_code, aircraft_text, aircraft_reg, aircraft_co2, aircraft_restricted,
        owner_name, owner_iata, owner_icao, airline, airline_iata, airline_icao,
        origin_iata, origin_offset, origin_offset_abbr, origin_offset_dst,
        origin_terminal, origin_gate,
        dest_iata, dest_icao, dest_offset, dest_offset_abbr, dest_offset_dst,
        dest_terminal, dest_gate,
        sched_dep, sched_arr, real_dep, real_arr,
        origin_lat, origin_lng, dest_lat, dest_lng, updated_at_ms
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(ingest_run_id, flight_key) DO UPDATE SET
        status_detail = excluded.status_detail,
        aircraft_code = excluded.aircraft_code,
        aircraft_text = excluded.aircraft_text,
        aircraft_reg = excluded.aircraft_reg,
        aircraft_co2 = excluded.aircraft_co2,
        aircraft_restricted = excluded.aircraft_restricted,
        owner_name = excluded.owner_name,
        owner_iata = excluded.owner_iata,
        owner_icao = excluded.owner_icao,
        airline = excluded.airline,
        airline_iata = excluded.airline_iata,
        airline_icao = excluded.airline_icao,
        origin_iata = excluded.origin_iata,
        origin_offset = excluded.origin_offset,
        origin_offset_abbr = excluded.origin_offset_abbr,
        origin_offset_dst = excluded.origin_offset_dst,
        origin_terminal = excluded.origin_terminal,
        origin_gate = excluded.origin_gate,
        dest_icao = excluded.dest_icao,
        dest_offset = excluded.dest_offset,
        dest_offset_abbr = excluded.dest_offset_abbr,
        dest_offset_dst = excluded.dest_offset_dst,
        dest_terminal = excluded.dest_terminal,
        dest_gate = excluded.dest_gate,
        sched_arr = excluded.sched_arr,
        real_dep = excluded.real_dep,
        real_arr = excluded.real_arr,
        origin_lat = excluded.origin_lat,
        origin_lng = excluded.origin_lng,
        dest_lat = excluded.dest_lat,
        dest_lng = excluded.dest_lng,
        updated_at_ms = excluded.updated_at_ms";

/// Upserts `records` under `run_id` in a single transaction.
///
/// Records without a flight number are skipped. A repeated record (same run
/// and `flight_key`) updates its row in place. Returns the number of records
/// written, not the number of rows in the table.
///
/// # Errors
///
/// Returns `DatabaseError::SqlError` if any statement fails; the transaction is
/// rolled back and nothing from this batch is kept.
pub async fn upsert_flights(
    pool: &SqlitePool,
    run_id: &str,
    records: &[FlightRecord],
) -> Result<usize, DatabaseError> {
    let persistable: Vec<&FlightRecord> =
        records.iter().filter(|r| r.is_persistable()).collect();
    if persistable.is_empty() {
        return Ok(0);
    }

    let skipped = records.len() - persistable.len();
    if skipped > 0 {
        debug!("Skipped {skipped} records without a flight number");
    }
    let span = PerfSpan::start("db.upsert_flights")
        .tag("run_id", run_id)
        .tag("records", persistable.len());
    timed(span, write_batch(pool, run_id, &persistable)).await
}

async fn write_batch(
    pool: &SqlitePool,
    run_id: &str,
    persistable: &[&FlightRecord],
) -> Result<usize, DatabaseError> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let mut tx = pool.begin().await?;
    for record in persistable {
        sqlx::query(UPSERT_FLIGHT_SQL)
            .bind(run_id)
            .bind(record.flight_key())
            .bind(&record.flight_num)
            .bind(&record.status_detail)
            .bind(&record.aircraft_code)
            .bind(&record.aircraft_text)
            .bind(&record.aircraft_reg)
            .bind(record.aircraft_co2)
            .bind(record.aircraft_restricted)
            .bind(&record.owner_name)
            .bind(&record.owner_iata)
            .bind(&record.owner_icao)
            .bind(&record.airline)
            .bind(&record.airline_iata)
            .bind(&record.airline_icao)
            .bind(&record.origin_iata)
            .bind(record.origin_offset)
            .bind(&record.origin_offset_abbr)
            .bind(record.origin_offset_dst)
            .bind(&record.origin_terminal)
            .bind(&record.origin_gate)
            .bind(&record.dest_iata)
            .bind(&record.dest_icao)
            .bind(record.dest_offset)
            .bind(&record.dest_offset_abbr)
            .bind(record.dest_offset_dst)
            .bind(&record.dest_terminal)
            .bind(&record.dest_gate)
            .bind(record.sched_dep)
            .bind(record.sched_arr)
            .bind(record.real_dep)
            .bind(record.real_arr)
            .bind(record.origin_lat)
            .bind(record.origin_lng)
            .bind(record.dest_lat)
            .bind(record.dest_lng)
            .bind(now_ms)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(persistable.len())
}
