//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `flight_ingest` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger, database and proxy pool setup
//! - The `--refresh-commercial-view` maintenance mode
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use flight_ingest::alerts::{self, TelegramAlerter};
use flight_ingest::api::{DepartureProbe, FlightRadarClient};
use flight_ingest::config::{Opt, ProxyBuildOptions};
use flight_ingest::initialization::{create_run_log_file, init_logger_with};
use flight_ingest::jobs::JobDeps;
use flight_ingest::proxy::{ProxyPool, ProxySource};
use flight_ingest::storage::{
    init_db_pool_with_path, load_airline_codes, refresh_commercial_view, run_migrations,
    SqliteStore, COMMERCIAL_VIEW_NAME,
};
use flight_ingest::{run_job, RunStatus};

#[tokio::main]
async fn main() -> Result<()> {
    // Try the working directory first, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();
    let app = opt.app_config();

    let log_file = match &opt.log_dir {
        Some(dir) => {
            let (file, path) = create_run_log_file(dir, &app.app_name)
                .context("Failed to create run log file")?;
            eprintln!("Logging to {}", path.display());
            Some(file)
        }
        None => None,
    };
    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone(), log_file)
        .context("Failed to initialize logger")?;

    let pool = init_db_pool_with_path(&app.db_path)
        .await
        .with_context(|| format!("Failed to open database {}", app.db_path.display()))?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    if opt.refresh_commercial_view {
        let path = opt.airlines_path();
        let codes = load_airline_codes(&path)
            .with_context(|| format!("Failed to read airline blocklist {}", path.display()))?;
        refresh_commercial_view(&pool, &codes)
            .await
            .context("Failed to rebuild flights_commercial view")?;
        println!(
            "Updated view {COMMERCIAL_VIEW_NAME} with {} airline ICAO code(s) from {}",
            codes.len(),
            path.display()
        );
        return Ok(());
    }

    let mut client = FlightRadarClient::new().context("Failed to build API client")?;
    if let Some(options) = opt.proxy_options() {
        if let Some(source) = build_proxy_source(&options, &opt.proxy_probe_airport).await? {
            client = client.with_proxy_source(source);
        }
    }

    if let (Some(token), Some(chat_id)) = (&opt.telegram_bot_token, &opt.telegram_chat_id) {
        let alerter = TelegramAlerter::new(token, chat_id, opt.telegram_parse_mode.clone())
            .context("Failed to build Telegram alerter")?;
        alerts::install(Arc::new(alerter));
        info!("Telegram alerts enabled");
    }

    let deps = JobDeps::sqlite(SqliteStore::new(pool), &app.data_dir);
    match run_job(&app, &deps, Arc::new(client), &opt.run_config()).await {
        Ok(report) => {
            let marker = match report.status {
                RunStatus::Ok => "✅",
                RunStatus::Degraded => "⚠️",
            };
            println!(
                "{marker} Region {}: {} task{} ({} gave up), {} records upserted in {:.1}s - status {}",
                report.region,
                report.total_tasks,
                if report.total_tasks == 1 { "" } else { "s" },
                report.give_ups,
                report.records_upserted,
                report.elapsed.as_secs_f64(),
                report.status
            );
            println!("Run id {} saved in {}", report.run_id, app.db_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("flight_ingest error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Builds the validated proxy pool, or `None` when no proxy survived or the
/// candidate list was unavailable. Proxies are optional; the run goes direct.
async fn build_proxy_source(
    options: &ProxyBuildOptions,
    probe_airport: &str,
) -> Result<Option<Arc<dyn ProxySource>>> {
    let probe_client = FlightRadarClient::with_timeouts(
        options.connect_timeout,
        options.connect_timeout + options.read_timeout,
    )
    .context("Failed to build proxy probe client")?;
    let probe = DepartureProbe::new(Arc::new(probe_client), probe_airport);

    match ProxyPool::build(options, Arc::new(probe)).await {
        Ok(build) if build.pool.is_empty() => {
            warn!(
                "No proxies survived validation ({} fetched, {} passed stage 1); running direct",
                build.counts.fetched, build.counts.stage1
            );
            Ok(None)
        }
        Ok(build) => {
            info!(
                "Proxy pool ready: {} fetched, {} passed stage 1, {} kept",
                build.counts.fetched, build.counts.stage1, build.counts.stage2
            );
            Ok(Some(Arc::new(build.pool)))
        }
        Err(e) => {
            warn!("Proxy pool unavailable: {e}; running direct");
            Ok(None)
        }
    }
}
