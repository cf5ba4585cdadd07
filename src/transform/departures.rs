//! Departures payload to [`FlightRecord`] mapping.
//!
//! The upstream schema is loose: fields go missing, numbers arrive as
//! strings, and timezone offsets come in hours or seconds. Every accessor here
//! is lenient and yields `None` rather than failing.

use serde_json::Value;

use crate::transform::record::{CoordinateMap, FlightRecord};

const DEPARTURES_PATH: &[&str] = &[
    "result",
    "response",
    "airport",
    "pluginData",
    "schedule",
    "departures",
    "data",
];

/// Placeholder for departures without a published flight number.
pub const UNKNOWN_FLIGHT_NUM: &str = "-";

fn at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn opt_str(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn opt_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn opt_float(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn opt_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => Some(true),
            "false" | "f" | "0" | "no" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Offsets above 24 in magnitude are seconds; convert to whole hours.
fn tz_offset_hours(value: Option<&Value>) -> Option<i64> {
    let offset = opt_int(value)?;
    if offset.unsigned_abs() > 24 {
        Some(offset / 3600)
    } else {
        Some(offset)
    }
}

/// Extracts departure records from an airport schedule payload.
///
/// Missing or non-array sections yield an empty vec. Origin coordinates come
/// from `coordinates`; destination coordinates come from the payload.
pub fn extract_departure_records(
    payload: &Value,
    origin_code: &str,
    coordinates: &CoordinateMap,
) -> Vec<FlightRecord> {
    let Some(Value::Array(departures)) = at(payload, DEPARTURES_PATH) else {
        return Vec::new();
    };

    let origin = origin_code.trim().to_ascii_uppercase();
    let origin_coords = coordinates.get(&origin);

    departures
        .iter()
        .map(|item| {
            let get = |path: &[&str]| at(item, path);
            FlightRecord {
                flight_num: opt_str(get(&["flight", "identification", "number", "default"]))
                    .or_else(|| Some(UNKNOWN_FLIGHT_NUM.to_string())),
                status_detail: opt_str(get(&["flight", "status", "text"])),
                aircraft_code: opt_str(get(&["flight", "aircraft", "model", "code"])),
                aircraft_text: opt_str(get(&["flight", "aircraft", "model", "text"])),
                aircraft_reg: opt_str(get(&["flight", "aircraft", "registration"])),
                aircraft_co2: opt_float(get(&["flight", "aircraft", "co2", "value"])),
                aircraft_restricted: opt_bool(get(&["flight", "aircraft", "restricted"])),
                owner_name: opt_str(get(&["flight", "owner", "name"])),
                owner_iata: opt_str(get(&["flight", "owner", "code", "iata"])),
                owner_icao: opt_str(get(&["flight", "owner", "code", "icao"])),
                airline: opt_str(get(&["flight", "airline", "name"])),
                airline_iata: opt_str(get(&["flight", "airline", "code", "iata"])),
                airline_icao: opt_str(get(&["flight", "airline", "code", "icao"])),
                origin_iata: Some(origin.clone()),
                origin_offset: tz_offset_hours(get(&[
                    "flight", "airport", "origin", "timezone", "offset",
                ])),
                origin_offset_abbr: opt_str(get(&[
                    "flight", "airport", "origin", "timezone", "abbr",
                ])),
                origin_offset_dst: opt_bool(get(&[
                    "flight", "airport", "origin", "timezone", "isDst",
                ])),
                origin_terminal: opt_str(get(&["flight", "airport", "origin", "info", "terminal"])),
                origin_gate: opt_str(get(&["flight", "airport", "origin", "info", "gate"])),
                dest_iata: opt_str(get(&["flight", "airport", "destination", "code", "iata"])),
                dest_icao: opt_str(get(&["flight", "airport", "destination", "code", "icao"])),
                dest_offset: tz_offset_hours(get(&[
                    "flight", "airport", "destination", "timezone", "offset",
                ])),
                dest_offset_abbr: opt_str(get(&[
                    "flight", "airport", "destination", "timezone", "abbr",
                ])),
                dest_offset_dst: opt_bool(get(&[
                    "flight", "airport", "destination", "timezone", "isDst",
                ])),
                dest_terminal: opt_str(get(&[
                    "flight", "airport", "destination", "info", "terminal",
                ])),
                dest_gate: opt_str(get(&["flight", "airport", "destination", "info", "gate"])),
                sched_dep: opt_int(get(&["flight", "time", "scheduled", "departure"])),
                sched_arr: opt_int(get(&["flight", "time", "scheduled", "arrival"])),
                real_dep: opt_int(get(&["flight", "time", "real", "departure"])),
                real_arr: opt_int(get(&["flight", "time", "real", "arrival"])),
                origin_lat: origin_coords.map(|c| c.lat),
                origin_lng: origin_coords.map(|c| c.lng),
                dest_lat: opt_float(get(&[
                    "flight", "airport", "destination", "position", "latitude",
                ])),
                dest_lng: opt_float(get(&[
                    "flight", "airport", "destination", "position", "longitude",
                ])),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::record::Coordinates;
    use serde_json::json;

    fn wrap(data: Value) -> Value {
        json!({
            "result": {"response": {"airport": {"pluginData": {"schedule": {
                "departures": {"data": data}
            }}}}}
        })
    }

    fn departure() -> Value {
        json!({
            "flight": {
                "identification": {"number": {"default": "NH10"}},
                "status": {"text": "Scheduled"},
                "aircraft": {
                    "model": {"code": "B77W", "text": "Boeing 777-300ER"},
                    "registration": "JA780A",
                    "co2": {"value": "412.5"},
                    "restricted": "no"
                },
                "owner": {"name": "ANA", "code": {"iata": "NH", "icao": "ANA"}},
                "airline": {"name": "All Nippon Airways", "code": {"iata": "NH", "icao": "ANA"}},
                "airport": {
                    "origin": {
                        "timezone": {"offset": 32400, "abbr": "JST", "isDst": false},
                        "info": {"terminal": "1", "gate": "42"}
                    },
                    "destination": {
                        "code": {"iata": "JFK", "icao": "KJFK"},
                        "timezone": {"offset": -4, "abbr": "EDT", "isDst": 1},
                        "info": {"terminal": "7", "gate": null},
                        "position": {"latitude": 40.64, "longitude": "-73.78"}
                    }
                },
                "time": {
                    "scheduled": {"departure": 1700000000, "arrival": "1700046800"},
                    "real": {"departure": null, "arrival": null}
                }
            }
        })
    }

    #[test]
    fn test_extracts_full_record() {
        let mut coordinates = CoordinateMap::new();
        coordinates.insert("NRT".into(), Coordinates { lat: 35.77, lng: 140.39 });

        let records = extract_departure_records(&wrap(json!([departure()])), "nrt", &coordinates);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.flight_num.as_deref(), Some("NH10"));
        assert_eq!(record.origin_iata.as_deref(), Some("NRT"));
        assert_eq!(record.origin_offset, Some(9));
        assert_eq!(record.dest_offset, Some(-4));
        assert_eq!(record.dest_offset_dst, Some(true));
        assert_eq!(record.aircraft_restricted, Some(false));
        assert_eq!(record.aircraft_co2, Some(412.5));
        assert_eq!(record.sched_dep, Some(1_700_000_000));
        assert_eq!(record.sched_arr, Some(1_700_046_800));
        assert_eq!(record.real_dep, None);
        assert_eq!(record.dest_gate, None);
        assert_eq!(record.origin_lat, Some(35.77));
        assert_eq!(record.dest_lng, Some(-73.78));
        assert_eq!(record.flight_key(), "NH10|1700000000|JFK");
    }

    #[test]
    fn test_missing_flight_number_uses_placeholder() {
        let item = json!({"flight": {"identification": {"number": {"default": "  "}}}});
        let records = extract_departure_records(&wrap(json!([item])), "BUF", &CoordinateMap::new());
        assert_eq!(records[0].flight_num.as_deref(), Some(UNKNOWN_FLIGHT_NUM));
        assert_eq!(records[0].origin_lat, None);
    }

    #[test]
    fn test_missing_or_malformed_sections_yield_empty() {
        let coordinates = CoordinateMap::new();
        for payload in [
            json!({}),
            json!(null),
            json!({"result": {"response": {}}}),
            wrap(json!(null)),
            wrap(json!({"not": "a list"})),
            wrap(json!([])),
        ] {
            assert!(extract_departure_records(&payload, "HND", &coordinates).is_empty());
        }
    }

    #[test]
    fn test_negative_seconds_offset() {
        assert_eq!(tz_offset_hours(Some(&json!(-25200))), Some(-7));
        assert_eq!(tz_offset_hours(Some(&json!("19800"))), Some(5));
        assert_eq!(tz_offset_hours(Some(&json!(24))), Some(24));
        assert_eq!(tz_offset_hours(Some(&json!("x"))), None);
    }

    #[test]
    fn test_extreme_offset_does_not_overflow() {
        assert_eq!(
            tz_offset_hours(Some(&json!(i64::MIN))),
            Some(i64::MIN / 3600)
        );

        let mut item = departure();
        item["flight"]["airport"]["origin"]["timezone"]["offset"] = json!(i64::MIN);
        let records = extract_departure_records(&wrap(json!([item])), "NRT", &CoordinateMap::new());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].origin_offset, Some(i64::MIN / 3600));
    }
}
