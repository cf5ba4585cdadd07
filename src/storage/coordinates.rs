//! Airport coordinate lookup.

use log::{info, warn};
use sqlx::SqlitePool;

use crate::transform::{CoordinateMap, Coordinates};

/// Loads `airports(iata, latitude, longitude)` into an upper-cased map.
///
/// Rows missing any field are skipped. Query failures are logged and yield an
/// empty map; coordinates are enrichment only.
pub async fn load_coordinates(pool: &SqlitePool) -> CoordinateMap {
    let rows: Vec<(Option<String>, Option<f64>, Option<f64>)> = match sqlx::query_as(
        "SELECT iata, latitude, longitude FROM airports WHERE iata IS NOT NULL",
    )
    .fetch_all(pool)
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to load airport coordinates: {e}");
            return CoordinateMap::new();
        }
    };

    let coordinates: CoordinateMap = rows
        .into_iter()
        .filter_map(|(iata, lat, lng)| {
            let iata = iata?.trim().to_ascii_uppercase();
            if iata.is_empty() {
                return None;
            }
            Some((iata, Coordinates { lat: lat?, lng: lng? }))
        })
        .collect();
    info!("Loaded {} airport coordinate entries", coordinates.len());
    coordinates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::{create_test_pool, insert_airport};

    #[tokio::test]
    async fn test_load_coordinates_skips_incomplete_rows() {
        let pool = create_test_pool().await;
        insert_airport(&pool, "nrt", Some(35.76), Some(140.38)).await;
        insert_airport(&pool, "BUF", Some(42.94), None).await;

        let coordinates = load_coordinates(&pool).await;
        assert_eq!(coordinates.len(), 1);
        assert_eq!(
            coordinates.get("NRT"),
            Some(&Coordinates { lat: 35.76, lng: 140.38 })
        );
    }

    #[tokio::test]
    async fn test_load_coordinates_without_table_is_empty() {
        let pool = SqlitePool::connect("sqlite::memory:").await.expect("pool");
        assert!(load_coordinates(&pool).await.is_empty());
    }
}
