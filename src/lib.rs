//! flight_ingest library: airport departure ingestion
//!
//! This library pulls scheduled and actual departures for every airport of a
//! region from the departures API, normalises them into flight records and
//! upserts them into SQLite. Requests can be routed through a validated pool
//! of public HTTP proxies with a direct-connection fallback.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flight_ingest::api::FlightRadarClient;
//! use flight_ingest::jobs::JobDeps;
//! use flight_ingest::storage::{init_db_pool_with_path, run_migrations, SqliteStore};
//! use flight_ingest::{run_job, AppConfig, RunConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let app = AppConfig::default();
//! let pool = init_db_pool_with_path(&app.db_path).await?;
//! run_migrations(&pool).await?;
//!
//! let deps = JobDeps::sqlite(SqliteStore::new(pool), &app.data_dir);
//! let run_config = RunConfig {
//!     region: "JP".to_string(),
//!     max_pages: Some(1),
//!     ..Default::default()
//! };
//!
//! let report = run_job(&app, &deps, Arc::new(FlightRadarClient::new()?), &run_config).await?;
//! println!("Run {}: {} records, status {}",
//!          report.run_id, report.records_upserted, report.status);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod airports;
pub mod alerts;
pub mod api;
pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod jobs;
pub mod proxy;
pub mod retry;
pub mod storage;
pub mod transform;
pub mod utils;

// Re-export public API
pub use config::{AppConfig, LogFormat, LogLevel, ProxyFallback, ProxyStrategy, RunConfig};
pub use jobs::{run_job, JobDeps, RunReport, RunStatus};
pub use storage::{query_run_history, run_migrations, RunSummary};
