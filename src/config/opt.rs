//! Command-line options.
//!
//! Every flag that maps onto deployment configuration also reads an
//! environment variable, so a `.env` file loaded by the binary can supply it.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::constants::*;
use crate::config::types::{
    AppConfig, LogFormat, LogLevel, ProxyBuildOptions, ProxyFallback, ProxyStrategy, RunConfig,
};

/// Run the flight departures ingestion job for one region.
#[derive(Debug, Clone, Parser)]
#[command(name = "flight_ingest", version, about)]
pub struct Opt {
    /// Region code matching an airport list file (e.g. JP, US)
    #[arg(required_unless_present = "refresh_commercial_view")]
    pub region: Option<String>,

    /// Rebuild the flights_commercial view from the airline blocklist and exit
    #[arg(long)]
    pub refresh_commercial_view: bool,

    /// Airline ICAO blocklist (defaults to <data-dir>/filtered_airlines.txt)
    #[arg(long)]
    pub airlines_file: Option<PathBuf>,

    /// Max pages per airport to fetch (defaults to all)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Rows per page to request from the API
    #[arg(long, default_value_t = DEFAULT_LIMIT_PER_PAGE)]
    pub limit: u32,

    /// Total attempts per page, proxy and direct phases combined
    #[arg(long, default_value_t = DEFAULT_RETRY_ATTEMPTS)]
    pub retry_attempts: u32,

    /// Seconds to wait between API retries
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY_SECS)]
    pub retry_delay: f64,

    /// Seconds to wait between page fetches (sequential mode)
    #[arg(long, default_value_t = DEFAULT_PAGE_DELAY_SECS)]
    pub page_delay: f64,

    /// Seconds to wait between airports (sequential mode)
    #[arg(long, default_value_t = DEFAULT_AIRPORT_DELAY_SECS)]
    pub airport_delay: f64,

    /// Concurrent workers; more than 1 enables concurrent mode
    #[arg(long)]
    pub workers: Option<usize>,

    /// Give-ups tolerated before the run is reported DEGRADED
    #[arg(long, default_value_t = 0)]
    pub degraded_threshold: usize,

    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Directory containing airport_<REGION>.txt files
    #[arg(long, env = "DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Application name used in logs
    #[arg(long, env = "APP_NAME", default_value = DEFAULT_APP_NAME)]
    pub app_name: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Write logs to a per-run file in this directory instead of stderr
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Route API calls through a validated public proxy pool
    #[arg(long)]
    pub use_proxies: bool,

    /// URL returning a host:port proxy list
    #[arg(long, default_value = DEFAULT_PROXY_SOURCE_URL)]
    pub proxy_source_url: String,

    /// Generic endpoint for stage-1 proxy validation
    #[arg(long, default_value = DEFAULT_PROXY_STAGE1_URL)]
    pub proxy_stage1_url: String,

    /// Candidate proxies kept after dedupe
    #[arg(long, default_value_t = DEFAULT_PROXY_FETCH_LIMIT)]
    pub proxy_fetch_limit: usize,

    /// Validated proxies kept after latency ranking
    #[arg(long, default_value_t = DEFAULT_PROXY_SURVIVORS_MAX)]
    pub proxy_survivors_max: usize,

    /// Proxy probe connect timeout in seconds
    #[arg(long, default_value_t = DEFAULT_PROXY_CONNECT_TIMEOUT_SECS)]
    pub proxy_connect_timeout: f64,

    /// Proxy probe read timeout in seconds
    #[arg(long, default_value_t = DEFAULT_PROXY_READ_TIMEOUT_SECS)]
    pub proxy_read_timeout: f64,

    /// Concurrent proxy probes
    #[arg(long, default_value_t = DEFAULT_PROXY_MAX_WORKERS)]
    pub proxy_workers: usize,

    /// Reject stage-1 probes slower than this many milliseconds (0 disables)
    #[arg(long, default_value_t = DEFAULT_PROXY_LATENCY_THRESHOLD_MS)]
    pub proxy_latency_ms: f64,

    /// Proxy rotation strategy
    #[arg(long, value_enum, default_value = "round-robin")]
    pub proxy_strategy: ProxyStrategy,

    /// Failures before a proxy is evicted
    #[arg(long, default_value_t = DEFAULT_PROXY_MAX_FAILURES)]
    pub proxy_max_failures: u32,

    /// Airport used by the stage-2 probe against the real API
    #[arg(long, default_value = "HND")]
    pub proxy_probe_airport: String,

    /// Reserve part of the retry budget for direct (unproxied) attempts
    #[arg(long)]
    pub proxy_direct_fallback: bool,

    /// Attempts reserved for the direct phase
    #[arg(long, default_value_t = 1)]
    pub proxy_direct_attempts: u32,

    /// Jump to the direct phase when the last proxy attempt is rate limited
    #[arg(long)]
    pub fallback_on_429: bool,

    /// Telegram bot token for DEGRADED alerts
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat receiving alerts
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    /// Telegram parse mode (HTML or MarkdownV2)
    #[arg(long, env = "TELEGRAM_PARSE_MODE")]
    pub telegram_parse_mode: Option<String>,
}

impl Opt {
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            db_path: self.db_path.clone(),
            data_dir: self.data_dir.clone(),
            app_name: self.app_name.clone(),
        }
    }

    pub fn run_config(&self) -> RunConfig {
        let proxy_fallback = self.proxy_direct_fallback.then_some(ProxyFallback {
            enabled: true,
            direct_attempts: self.proxy_direct_attempts,
            fallback_on_429: self.fallback_on_429,
        });
        RunConfig {
            region: self.region.clone().unwrap_or_default(),
            max_pages: self.max_pages,
            limit_per_page: self.limit,
            retry_attempts: self.retry_attempts,
            retry_delay: secs(self.retry_delay),
            page_delay: secs(self.page_delay),
            airport_delay: secs(self.airport_delay),
            concurrent_workers: self.workers,
            proxy_fallback,
            degraded_fail_threshold: self.degraded_threshold,
        }
    }

    /// Blocklist used by `--refresh-commercial-view`.
    pub fn airlines_path(&self) -> PathBuf {
        self.airlines_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(AIRLINE_BLOCKLIST_FILE))
    }

    /// Proxy pool options, or `None` when proxies are disabled.
    pub fn proxy_options(&self) -> Option<ProxyBuildOptions> {
        if !self.use_proxies {
            return None;
        }
        Some(ProxyBuildOptions {
            source_url: self.proxy_source_url.clone(),
            stage1_url: self.proxy_stage1_url.clone(),
            fetch_limit: self.proxy_fetch_limit,
            survivors_max: self.proxy_survivors_max,
            connect_timeout: secs(self.proxy_connect_timeout),
            read_timeout: secs(self.proxy_read_timeout),
            max_workers: self.proxy_workers.max(1),
            latency_threshold_ms: (self.proxy_latency_ms > 0.0).then_some(self.proxy_latency_ms),
            strategy: self.proxy_strategy,
            max_failures: self.proxy_max_failures,
        })
    }
}

/// Negative or NaN inputs collapse to zero rather than panicking.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opt_defaults_map_to_run_config() {
        let opt = Opt::parse_from(["flight_ingest", "jp"]);
        let run = opt.run_config();
        assert_eq!(run.region, "jp");
        assert_eq!(run.limit_per_page, 100);
        assert_eq!(run.retry_attempts, 3);
        assert_eq!(run.retry_delay, Duration::from_secs(2));
        assert_eq!(run.page_delay, Duration::from_secs(5));
        assert_eq!(run.airport_delay, Duration::from_secs(30));
        assert!(run.proxy_fallback.is_none());
        assert!(opt.proxy_options().is_none());
    }

    #[test]
    fn test_opt_proxy_flags() {
        let opt = Opt::parse_from([
            "flight_ingest",
            "US",
            "--use-proxies",
            "--proxy-direct-fallback",
            "--proxy-direct-attempts",
            "2",
            "--fallback-on-429",
            "--proxy-latency-ms",
            "0",
            "--proxy-strategy",
            "random",
            "--workers",
            "4",
        ]);
        let run = opt.run_config();
        assert_eq!(
            run.proxy_fallback,
            Some(ProxyFallback {
                enabled: true,
                direct_attempts: 2,
                fallback_on_429: true,
            })
        );
        assert_eq!(run.worker_count(), Some(4));

        let proxy = opt.proxy_options().expect("proxies enabled");
        assert_eq!(proxy.latency_threshold_ms, None);
        assert_eq!(proxy.strategy, ProxyStrategy::Random);
    }

    #[test]
    fn test_refresh_view_does_not_need_a_region() {
        let opt = Opt::parse_from([
            "flight_ingest",
            "--refresh-commercial-view",
            "--data-dir",
            "/srv/data",
        ]);
        assert!(opt.refresh_commercial_view);
        assert_eq!(opt.region, None);
        assert_eq!(
            opt.airlines_path(),
            PathBuf::from("/srv/data").join("filtered_airlines.txt")
        );

        let opt = Opt::parse_from([
            "flight_ingest",
            "--refresh-commercial-view",
            "--airlines-file",
            "blocked.txt",
        ]);
        assert_eq!(opt.airlines_path(), PathBuf::from("blocked.txt"));

        assert!(Opt::try_parse_from(["flight_ingest"]).is_err());
    }

    #[test]
    fn test_secs_clamps_invalid_values() {
        assert_eq!(secs(-1.0), Duration::ZERO);
        assert_eq!(secs(f64::NAN), Duration::ZERO);
        assert_eq!(secs(1.5), Duration::from_millis(1500));
    }
}
