//! Payload-to-record transformation.

mod departures;
mod record;

use serde_json::Value;

pub use departures::{extract_departure_records, UNKNOWN_FLIGHT_NUM};
pub use record::{CoordinateMap, Coordinates, FlightRecord};

/// Turns one decoded API payload into flight records.
pub trait RecordTransform: Send + Sync {
    fn transform(
        &self,
        payload: &Value,
        origin_code: &str,
        coordinates: &CoordinateMap,
    ) -> Vec<FlightRecord>;
}

/// Default transform for the airport departures schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepartureTransform;

impl RecordTransform for DepartureTransform {
    fn transform(
        &self,
        payload: &Value,
        origin_code: &str,
        coordinates: &CoordinateMap,
    ) -> Vec<FlightRecord> {
        extract_departure_records(payload, origin_code, coordinates)
    }
}
