//! Configuration constants.
//!
//! Defaults for the upstream API, the proxy validation pipeline and the job
//! runner. CLI flags override the ones that are user-facing.

use std::time::Duration;

/// Departures endpoint of the flight-tracking API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.flightradar24.com/common/v1/airport.json";

/// User-Agent sent with every upstream request and proxy probe.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Per-request timeout for departures calls
pub const API_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_APP_NAME: &str = "flight-data";
pub const DEFAULT_DB_PATH: &str = "./flight_data.db";
pub const DEFAULT_DATA_DIR: &str = "./data";
/// Airline ICAO blocklist inside the data directory
pub const AIRLINE_BLOCKLIST_FILE: &str = "filtered_airlines.txt";

// Job runner defaults
pub const DEFAULT_LIMIT_PER_PAGE: u32 = 100;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 2.0;
pub const DEFAULT_PAGE_DELAY_SECS: f64 = 5.0;
pub const DEFAULT_AIRPORT_DELAY_SECS: f64 = 30.0;

/// Pages run from the per-airport legacy offset up to, but excluding, this page.
pub const PAGE_SEQUENCE_END: i32 = 2;

// Rate limiting
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
/// Floor for the sleep after a 429 whose Retry-After header cannot be parsed
pub const RATE_LIMIT_FALLBACK_DELAY: Duration = Duration::from_secs(30);

// Proxy list fetching
pub const DEFAULT_PROXY_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt";
pub const DEFAULT_PROXY_STAGE1_URL: &str = "https://httpbin.org/ip";
pub const PROXY_LIST_TIMEOUT: Duration = Duration::from_secs(8);
/// Attempts (initial + retries) when downloading the candidate list
pub const PROXY_LIST_FETCH_ATTEMPTS: usize = 3;
pub const PROXY_LIST_RETRY_INITIAL_DELAY_MS: u64 = 500;

// Proxy validation defaults
pub const DEFAULT_PROXY_FETCH_LIMIT: usize = 300;
pub const DEFAULT_PROXY_SURVIVORS_MAX: usize = 50;
pub const DEFAULT_PROXY_CONNECT_TIMEOUT_SECS: f64 = 2.0;
pub const DEFAULT_PROXY_READ_TIMEOUT_SECS: f64 = 4.0;
pub const DEFAULT_PROXY_MAX_WORKERS: usize = 32;
pub const DEFAULT_PROXY_LATENCY_THRESHOLD_MS: f64 = 1500.0;
pub const DEFAULT_PROXY_MAX_FAILURES: u32 = 2;
/// Statuses accepted by the generic (stage-1) probe
pub const STAGE1_ACCEPT_STATUS: &[u16] = &[200, 204];

// Alerting
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;
pub const TELEGRAM_TIMEOUT: Duration = Duration::from_secs(10);
