//! `flights_commercial` view: flights minus cargo, freighters, legacy
//! non-passenger types and a configurable airline blocklist.
//!
//! The view is rebuilt from scratch each time so blocklist edits take effect
//! immediately.

use std::collections::HashSet;
use std::path::Path;

use log::info;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

pub const COMMERCIAL_VIEW_NAME: &str = "flights_commercial";

/// Freighter and legacy type codes excluded when no aircraft text is present.
const FREIGHTER_TYPE_CODES: &[&str] = &[
    "B77F", "B77L", "B741", "76F", "74F", "74Y", "77F", "74N", "77X", "75F", "747", "741", "74H",
    "73E", "33F", "33X", "33Y",
];

/// Passenger operators still flying the B744.
const B744_PASSENGER_AIRLINES: &[&str] = &["LH", "CA", "FV"];

/// Parses one ICAO code per line: trimmed, upper-cased, blanks skipped, first
/// occurrence kept.
pub fn parse_airline_codes(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(|line| line.trim().to_ascii_uppercase())
        .filter(|code| !code.is_empty())
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

/// Reads and parses the blocklist at `path`.
///
/// # Errors
///
/// Returns the I/O error when the file is missing or unreadable.
pub fn load_airline_codes(path: &Path) -> std::io::Result<Vec<String>> {
    Ok(parse_airline_codes(&std::fs::read_to_string(path)?))
}

/// Single-quoted SQL literal with embedded quotes doubled.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn literal_list<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| quote_literal(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// `CREATE VIEW` statement for the commercial-flights view.
///
/// Blocklist codes are upper-cased; an empty blocklist drops that clause.
pub fn build_view_sql<S: AsRef<str>>(blocklist: &[S]) -> String {
    let blocklist: Vec<String> = blocklist
        .iter()
        .map(|code| code.as_ref().trim().to_ascii_uppercase())
        .filter(|code| !code.is_empty())
        .collect();
    let blocklist_clause = if blocklist.is_empty() {
        String::new()
    } else {
        format!(
            "    OR UPPER(COALESCE(f.airline_icao, '')) IN ({})\n",
            literal_list(&blocklist)
        )
    };

    format!(
        "CREATE VIEW {COMMERCIAL_VIEW_NAME} AS
SELECT f.*
FROM flights f
WHERE NOT (
    COALESCE(f.owner_name, '') LIKE '%cargo%'
    OR COALESCE(f.owner_name, '') LIKE '%freight%'
    OR COALESCE(f.airline, '') LIKE '%cargo%'
    OR COALESCE(f.airline, '') LIKE '%freight%'
    OR (
        (COALESCE(f.aircraft_text, '') LIKE '%Boeing%'
            OR COALESCE(f.aircraft_text, '') LIKE '%CRJ%'
            OR COALESCE(f.aircraft_text, '') LIKE '%Airbus%'
            OR COALESCE(f.aircraft_text, '') LIKE '%McDonnell%')
        AND COALESCE(f.aircraft_text, '') GLOB '*F'
    )
    OR (
        COALESCE(f.aircraft_text, '') = ''
        AND COALESCE(f.aircraft_code, '') IN ({freighters})
    )
    OR COALESCE(f.aircraft_text, '') IN ('Boeing 747-48E(BDSF)')
    OR (
        COALESCE(f.aircraft_code, '') = 'B744'
        AND (f.airline_iata IS NULL OR f.airline_iata NOT IN ({b744}))
    )
{blocklist_clause}    OR f.dest_iata IS NULL
    OR UPPER(COALESCE(f.dest_iata, '')) = 'NULL'
    OR (f.airline IS NULL AND f.airline_icao IS NULL)
    OR COALESCE(f.airline, '') LIKE 'Private owner'
)",
        freighters = literal_list(FREIGHTER_TYPE_CODES),
        b744 = literal_list(B744_PASSENGER_AIRLINES),
    )
}

/// Drops and recreates the view with `blocklist` in one transaction.
///
/// # Errors
///
/// Returns `DatabaseError::SqlError` if either statement fails; the previous
/// view is kept in that case.
pub async fn refresh_commercial_view<S: AsRef<str>>(
    pool: &SqlitePool,
    blocklist: &[S],
) -> Result<(), DatabaseError> {
    let create = build_view_sql(blocklist);
    let mut tx = pool.begin().await?;
    sqlx::query(&format!("DROP VIEW IF EXISTS {COMMERCIAL_VIEW_NAME}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&create).execute(&mut *tx).await?;
    tx.commit().await?;
    info!(
        "Rebuilt view {COMMERCIAL_VIEW_NAME} with {} blocked airline(s)",
        blocklist.len()
    );
    Ok(())
}
