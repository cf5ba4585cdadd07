// Shared fakes for the integration tests.
//
// Each test binary pulls this in with `mod helpers;` and uses what it needs.

#![allow(dead_code)] // Not every test file uses every helper

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use flight_ingest::airports::AirportDirectory;
use flight_ingest::api::{DepartureFetcher, DepartureRequest, Route};
use flight_ingest::error_handling::{AirportListError, DatabaseError, FetchError};
use flight_ingest::jobs::JobDeps;
use flight_ingest::proxy::{ProxyMapping, ProxySource};
use flight_ingest::storage::{CoordinateSource, FlightStore, RunMetadata, RunStats};
use flight_ingest::transform::{CoordinateMap, Coordinates, DepartureTransform, FlightRecord};
use flight_ingest::RunConfig;

/// Airport lists held in memory, keyed by region.
pub struct StaticAirports(pub HashMap<String, Vec<String>>);

impl StaticAirports {
    pub fn single(region: &str, codes: &[&str]) -> Self {
        let mut lists = HashMap::new();
        lists.insert(
            region.to_string(),
            codes.iter().map(|c| c.to_string()).collect(),
        );
        Self(lists)
    }
}

impl AirportDirectory for StaticAirports {
    fn load_codes(&self, region: &str) -> Result<Vec<String>, AirportListError> {
        self.0
            .get(region)
            .cloned()
            .ok_or_else(|| AirportListError::NotFound(format!("airport_{region}.txt").into()))
    }
}

/// Captures every write the runner makes.
#[derive(Default)]
pub struct RecordingStore {
    pub upserts: Mutex<Vec<(String, Vec<FlightRecord>)>>,
    pub begun: Mutex<Vec<String>>,
    pub finished: Mutex<Vec<(String, String, i64)>>,
    pub fail_upserts: bool,
}

impl RecordingStore {
    pub fn failing() -> Self {
        Self {
            fail_upserts: true,
            ..Default::default()
        }
    }

    pub fn upserts(&self) -> Vec<(String, Vec<FlightRecord>)> {
        self.upserts.lock().expect("lock").clone()
    }

    pub fn finished(&self) -> Vec<(String, String, i64)> {
        self.finished.lock().expect("lock").clone()
    }
}

#[async_trait]
impl FlightStore for RecordingStore {
    async fn upsert_flights(
        &self,
        run_id: &str,
        records: &[FlightRecord],
    ) -> Result<usize, DatabaseError> {
        if self.fail_upserts {
            return Err(DatabaseError::SqlError(sqlx::Error::PoolTimedOut));
        }
        self.upserts
            .lock()
            .expect("lock")
            .push((run_id.to_string(), records.to_vec()));
        Ok(records.len())
    }

    async fn begin_run(&self, meta: &RunMetadata<'_>) -> Result<(), DatabaseError> {
        self.begun.lock().expect("lock").push(meta.run_id.to_string());
        Ok(())
    }

    async fn finish_run(&self, stats: &RunStats<'_>) -> Result<(), DatabaseError> {
        self.finished.lock().expect("lock").push((
            stats.run_id.to_string(),
            stats.status.to_string(),
            stats.give_ups,
        ));
        Ok(())
    }
}

/// Fixed coordinate table.
pub struct StaticCoordinates(pub CoordinateMap);

#[async_trait]
impl CoordinateSource for StaticCoordinates {
    async fn load_coordinates(&self) -> CoordinateMap {
        self.0.clone()
    }
}

pub fn coordinates(entries: &[(&str, f64, f64)]) -> StaticCoordinates {
    StaticCoordinates(
        entries
            .iter()
            .map(|(code, lat, lng)| (code.to_string(), Coordinates { lat: *lat, lng: *lng }))
            .collect(),
    )
}

pub fn job_deps(
    airports: StaticAirports,
    store: Arc<RecordingStore>,
    coords: StaticCoordinates,
) -> JobDeps {
    JobDeps {
        airports: Arc::new(airports),
        transform: Arc::new(DepartureTransform),
        store,
        coordinates: Arc::new(coords),
    }
}

/// Fetcher that always fails with the same retryable status.
pub struct AlwaysFails;

#[async_trait]
impl DepartureFetcher for AlwaysFails {
    async fn fetch_departures(
        &self,
        _request: &DepartureRequest,
        _route: Route,
    ) -> Result<Value, FetchError> {
        Err(FetchError::Status(503))
    }
}

/// Returns one departure per request, numbered after the requested airport,
/// and records every (airport, page, route) it was asked for.
#[derive(Default)]
pub struct OneDepartureEach {
    pub calls: Mutex<Vec<(String, i32, Route)>>,
    /// Destination per origin airport; LAX when absent
    pub destinations: HashMap<String, String>,
}

impl OneDepartureEach {
    pub fn with_destinations(pairs: &[(&str, &str)]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            destinations: pairs
                .iter()
                .map(|(origin, dest)| (origin.to_string(), dest.to_string()))
                .collect(),
        }
    }

    pub fn calls(&self) -> Vec<(String, i32, Route)> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl DepartureFetcher for OneDepartureEach {
    async fn fetch_departures(
        &self,
        request: &DepartureRequest,
        route: Route,
    ) -> Result<Value, FetchError> {
        self.calls
            .lock()
            .expect("lock")
            .push((request.airport_code.clone(), request.page, route));
        let dest = self
            .destinations
            .get(&request.airport_code)
            .map(String::as_str)
            .unwrap_or("LAX");
        Ok(departures_payload(vec![departure(
            &format!("{}1", request.airport_code),
            1_700_000_000,
            dest,
        )]))
    }
}

/// Replays a fixed script of results, then fails with 503.
pub struct Scripted {
    results: Mutex<VecDeque<Result<Value, FetchError>>>,
    pub routes: Mutex<Vec<Route>>,
}

impl Scripted {
    pub fn new(results: Vec<Result<Value, FetchError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            routes: Mutex::new(Vec::new()),
        }
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("lock").clone()
    }
}

#[async_trait]
impl DepartureFetcher for Scripted {
    async fn fetch_departures(
        &self,
        _request: &DepartureRequest,
        route: Route,
    ) -> Result<Value, FetchError> {
        self.routes.lock().expect("lock").push(route);
        self.results
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or(Err(FetchError::Status(503)))
    }
}

/// Hands out a fixed mapping and records every reported failure.
pub struct RecordingProxySource {
    pub mapping: ProxyMapping,
    pub reported: Mutex<Vec<ProxyMapping>>,
}

impl RecordingProxySource {
    pub fn new(mapping: ProxyMapping) -> Self {
        Self {
            mapping,
            reported: Mutex::new(Vec::new()),
        }
    }

    pub fn reported(&self) -> Vec<ProxyMapping> {
        self.reported.lock().expect("lock").clone()
    }
}

impl ProxySource for RecordingProxySource {
    fn next_proxy(&self) -> Option<ProxyMapping> {
        Some(self.mapping.clone())
    }

    fn report_failure(&self, mapping: &ProxyMapping) {
        self.reported.lock().expect("lock").push(mapping.clone());
    }
}

pub fn departure(flight_num: &str, sched_dep: i64, dest: &str) -> Value {
    json!({
        "flight": {
            "identification": {"number": {"default": flight_num}},
            "status": {"text": "Scheduled"},
            "airport": {
                "destination": {
                    "code": {"iata": dest},
                    "position": {"latitude": 33.94, "longitude": -118.41}
                }
            },
            "time": {"scheduled": {"departure": sched_dep}}
        }
    })
}

pub fn departures_payload(items: Vec<Value>) -> Value {
    json!({
        "result": {"response": {"airport": {"pluginData": {"schedule": {
            "departures": {"data": items}
        }}}}}
    })
}

/// Run configuration with every sleep disabled.
pub fn fast_run_config(region: &str) -> RunConfig {
    RunConfig {
        region: region.to_string(),
        retry_attempts: 1,
        retry_delay: Duration::ZERO,
        page_delay: Duration::ZERO,
        airport_delay: Duration::ZERO,
        ..Default::default()
    }
}
