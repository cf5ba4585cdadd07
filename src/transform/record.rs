//! Normalised departure record.

use std::collections::HashMap;

use serde::Serialize;

/// Latitude/longitude of an airport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Upper-cased IATA code to coordinates.
pub type CoordinateMap = HashMap<String, Coordinates>;

/// One scheduled or actual departure, flattened from the API payload.
///
/// Timestamps are epoch seconds; timezone offsets are whole hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlightRecord {
    pub flight_num: Option<String>,
    pub status_detail: Option<String>,
    pub aircraft_code: Option<String>,
    pub aircraft_text: Option<String>,
    pub aircraft_reg: Option<String>,
    pub aircraft_co2: Option<f64>,
    pub aircraft_restricted: Option<bool>,
    pub owner_name: Option<String>,
    pub owner_iata: Option<String>,
    pub owner_icao: Option<String>,
    pub airline: Option<String>,
    pub airline_iata: Option<String>,
    pub airline_icao: Option<String>,
    pub origin_iata: Option<String>,
    pub origin_offset: Option<i64>,
    pub origin_offset_abbr: Option<String>,
    pub origin_offset_dst: Option<bool>,
    pub origin_terminal: Option<String>,
    pub origin_gate: Option<String>,
    pub dest_iata: Option<String>,
    pub dest_icao: Option<String>,
    pub dest_offset: Option<i64>,
    pub dest_offset_abbr: Option<String>,
    pub dest_offset_dst: Option<bool>,
    pub dest_terminal: Option<String>,
    pub dest_gate: Option<String>,
    pub sched_dep: Option<i64>,
    pub sched_arr: Option<i64>,
    pub real_dep: Option<i64>,
    pub real_arr: Option<i64>,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub dest_lat: Option<f64>,
    pub dest_lng: Option<f64>,
}

impl FlightRecord {
    /// Identity of a flight within one ingest run:
    /// `flight_num|sched_dep|dest_iata`, missing parts left empty.
    ///
    /// ```
    /// use flight_ingest::transform::FlightRecord;
    ///
    /// let record = FlightRecord {
    ///     flight_num: Some("NH10".into()),
    ///     sched_dep: Some(1_700_000_000),
    ///     dest_iata: Some("JFK".into()),
    ///     ..Default::default()
    /// };
    /// assert_eq!(record.flight_key(), "NH10|1700000000|JFK");
    /// ```
    pub fn flight_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.flight_num.as_deref().unwrap_or(""),
            self.sched_dep.map(|t| t.to_string()).unwrap_or_default(),
            self.dest_iata.as_deref().unwrap_or("")
        )
    }

    /// Records without a flight number cannot be keyed and are not stored.
    pub fn is_persistable(&self) -> bool {
        self.flight_num.as_deref().is_some_and(|n| !n.is_empty())
    }
}
