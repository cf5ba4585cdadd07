//! Configuration types.
//!
//! Library-side configuration structs (no CLI dependencies) plus the enums
//! shared with the command-line parser.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_AIRPORT_DELAY_SECS, DEFAULT_APP_NAME, DEFAULT_DATA_DIR, DEFAULT_DB_PATH,
    DEFAULT_LIMIT_PER_PAGE, DEFAULT_PAGE_DELAY_SECS, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_DELAY_SECS,
};
use crate::error_handling::RunError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// How the proxy pool picks an endpoint for the next request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum ProxyStrategy {
    /// Cycle through endpoints in order
    #[default]
    RoundRobin,
    /// Pick uniformly at random
    Random,
}

/// Application-level configuration shared by every job invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file
    pub db_path: PathBuf,
    /// Directory holding `airport_<REGION>.txt` lists
    pub data_dir: PathBuf,
    /// Name used in log lines and log file names
    pub app_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

/// Split of the retry budget between proxied and direct attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyFallback {
    /// Whether a direct phase follows the proxy phase
    pub enabled: bool,
    /// Attempts reserved for the direct phase (taken out of the total budget)
    pub direct_attempts: u32,
    /// A 429 on the last proxy attempt jumps straight to the direct phase
    pub fallback_on_429: bool,
}

impl Default for ProxyFallback {
    fn default() -> Self {
        Self {
            enabled: true,
            direct_attempts: 1,
            fallback_on_429: true,
        }
    }
}

/// Immutable configuration for one `run_job` invocation.
///
/// # Examples
///
/// ```
/// use flight_ingest::RunConfig;
///
/// let run_config = RunConfig {
///     region: "JP".to_string(),
///     max_pages: Some(1),
///     ..Default::default()
/// };
/// assert!(run_config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Region token matching an airport list file
    pub region: String,
    /// Optional cap on pages fetched per airport
    pub max_pages: Option<usize>,
    /// Rows requested per page
    pub limit_per_page: u32,
    /// Total attempts per page (proxy phase + direct phase)
    pub retry_attempts: u32,
    /// Base sleep between attempts
    pub retry_delay: Duration,
    /// Sleep between pages of one airport (sequential mode only)
    pub page_delay: Duration,
    /// Sleep between airports (sequential mode only)
    pub airport_delay: Duration,
    /// Worker count; values above 1 switch the runner to concurrent mode
    pub concurrent_workers: Option<usize>,
    /// Optional proxy/direct attempt split
    pub proxy_fallback: Option<ProxyFallback>,
    /// Give-ups tolerated before the run is reported DEGRADED
    pub degraded_fail_threshold: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            max_pages: None,
            limit_per_page: DEFAULT_LIMIT_PER_PAGE,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: Duration::from_secs_f64(DEFAULT_RETRY_DELAY_SECS),
            page_delay: Duration::from_secs_f64(DEFAULT_PAGE_DELAY_SECS),
            airport_delay: Duration::from_secs_f64(DEFAULT_AIRPORT_DELAY_SECS),
            concurrent_workers: None,
            proxy_fallback: None,
            degraded_fail_threshold: 0,
        }
    }
}

impl RunConfig {
    /// Rejects configurations the runner cannot honour.
    ///
    /// # Errors
    ///
    /// Returns `RunError::InvalidConfig` for an empty region, a zero page limit,
    /// a zero retry budget, zero workers, or a direct-attempt split larger than
    /// the whole retry budget.
    pub fn validate(&self) -> Result<(), RunError> {
        if self.region.trim().is_empty() {
            return Err(RunError::InvalidConfig("region must be non-empty".into()));
        }
        if self.limit_per_page == 0 {
            return Err(RunError::InvalidConfig(
                "limit_per_page must be positive".into(),
            ));
        }
        if self.retry_attempts == 0 {
            return Err(RunError::InvalidConfig(
                "retry_attempts must be positive".into(),
            ));
        }
        if self.concurrent_workers == Some(0) {
            return Err(RunError::InvalidConfig(
                "concurrent_workers must be positive".into(),
            ));
        }
        if let Some(fallback) = self.proxy_fallback {
            if fallback.enabled && fallback.direct_attempts > self.retry_attempts {
                return Err(RunError::InvalidConfig(format!(
                    "direct_attempts ({}) exceeds retry_attempts ({})",
                    fallback.direct_attempts, self.retry_attempts
                )));
            }
        }
        Ok(())
    }

    /// Worker count when the concurrent path applies.
    pub fn worker_count(&self) -> Option<usize> {
        self.concurrent_workers.filter(|&workers| workers > 1)
    }
}

/// Parameters for building a validated proxy pool.
#[derive(Debug, Clone)]
pub struct ProxyBuildOptions {
    /// Text list of `host:port` candidates
    pub source_url: String,
    /// Generic reachability endpoint used by stage 1
    pub stage1_url: String,
    /// Candidates kept after dedupe/shuffle
    pub fetch_limit: usize,
    /// Survivors kept after latency ranking
    pub survivors_max: usize,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Concurrent probes per stage
    pub max_workers: usize,
    /// Stage-1 probes slower than this are rejected
    pub latency_threshold_ms: Option<f64>,
    pub strategy: ProxyStrategy,
    /// Failures before an endpoint is evicted from rotation
    pub max_failures: u32,
}

impl Default for ProxyBuildOptions {
    fn default() -> Self {
        use crate::config::constants::*;
        Self {
            source_url: DEFAULT_PROXY_SOURCE_URL.to_string(),
            stage1_url: DEFAULT_PROXY_STAGE1_URL.to_string(),
            fetch_limit: DEFAULT_PROXY_FETCH_LIMIT,
            survivors_max: DEFAULT_PROXY_SURVIVORS_MAX,
            connect_timeout: Duration::from_secs_f64(DEFAULT_PROXY_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs_f64(DEFAULT_PROXY_READ_TIMEOUT_SECS),
            max_workers: DEFAULT_PROXY_MAX_WORKERS,
            latency_threshold_ms: Some(DEFAULT_PROXY_LATENCY_THRESHOLD_MS),
            strategy: ProxyStrategy::RoundRobin,
            max_failures: DEFAULT_PROXY_MAX_FAILURES,
        }
    }
}
