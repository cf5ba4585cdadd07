//! Job runner: drives every (airport, page) task for a region through
//! fetch, transform and persist.
//!
//! Two modes:
//! - sequential: airports and pages in order, with page and airport delays
//! - concurrent: all tasks submitted to a bounded worker pool, no delays
//!
//! Per-task failures never abort a run. They are counted, and the run is
//! reported DEGRADED when give-ups exceed the configured threshold.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use log::{error, info, warn};
use uuid::Uuid;

use crate::airports::{AirportDirectory, AirportFiles};
use crate::alerts;
use crate::api::{DepartureFetcher, DepartureRequest};
use crate::config::{AppConfig, RunConfig};
use crate::error_handling::{ProcessingStats, RunError, TaskOutcome};
use crate::initialization::init_semaphore;
use crate::jobs::tasks::{build_task_list, page_sequence, Task};
use crate::retry::{fetch_with_fallback, FetchOutcome, RetryPolicy};
use crate::storage::{CoordinateSource, FlightStore, RunMetadata, RunStats, SqliteStore};
use crate::transform::{CoordinateMap, DepartureTransform, RecordTransform};

/// Collaborators the runner depends on.
#[derive(Clone)]
pub struct JobDeps {
    pub airports: Arc<dyn AirportDirectory>,
    pub transform: Arc<dyn RecordTransform>,
    pub store: Arc<dyn FlightStore>,
    pub coordinates: Arc<dyn CoordinateSource>,
}

impl JobDeps {
    /// Production wiring: airport files under `data_dir`, the departures
    /// transform, and one SQLite store serving both records and coordinates.
    pub fn sqlite(store: SqliteStore, data_dir: impl Into<PathBuf>) -> Self {
        let store = Arc::new(store);
        Self {
            airports: Arc::new(AirportFiles::new(data_dir)),
            transform: Arc::new(DepartureTransform),
            store: Arc::clone(&store) as Arc<dyn FlightStore>,
            coordinates: store,
        }
    }
}

/// Post-hoc health verdict of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    Degraded,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Ok => "OK",
            RunStatus::Degraded => "DEGRADED",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary returned by [`run_job`].
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Identifier tagging every record persisted by this run
    pub run_id: String,
    pub region: String,
    pub total_tasks: usize,
    pub records_upserted: usize,
    pub give_ups: usize,
    pub status: RunStatus,
    pub elapsed: Duration,
}

/// Shared, read-only state for every task of one run.
struct TaskContext {
    run_id: String,
    fetcher: Arc<dyn DepartureFetcher>,
    transform: Arc<dyn RecordTransform>,
    store: Arc<dyn FlightStore>,
    coordinates: CoordinateMap,
    policy: RetryPolicy,
    limit_per_page: u32,
    stats: ProcessingStats,
}

/// Runs one ingest job for `run_config.region`.
///
/// # Errors
///
/// Only configuration problems are returned: an invalid `run_config` or a
/// missing airport list. Task failures are logged and counted instead.
pub async fn run_job(
    app: &AppConfig,
    deps: &JobDeps,
    fetcher: Arc<dyn DepartureFetcher>,
    run_config: &RunConfig,
) -> Result<RunReport, RunError> {
    run_config.validate()?;
    let started = Instant::now();
    let run_id = Uuid::new_v4().to_string();
    let region = run_config.region.trim().to_ascii_uppercase();

    let airports = deps.airports.load_codes(&region)?;
    if airports.is_empty() {
        warn!("No airports configured for region {region}");
        return Ok(RunReport {
            run_id,
            region,
            total_tasks: 0,
            records_upserted: 0,
            give_ups: 0,
            status: RunStatus::Ok,
            elapsed: started.elapsed(),
        });
    }

    let coordinates = deps.coordinates.load_coordinates().await;
    info!("Using {} coordinate entries", coordinates.len());

    let start_time_ms = chrono::Utc::now().timestamp_millis();
    if let Err(e) = deps
        .store
        .begin_run(&RunMetadata {
            run_id: &run_id,
            region: &region,
            version: env!("CARGO_PKG_VERSION"),
            start_time_ms,
        })
        .await
    {
        warn!("Failed to record run metadata: {e}");
    }

    info!(
        "{} run {run_id} started for region {region} ({} airports)",
        app.app_name,
        airports.len()
    );

    let ctx = Arc::new(TaskContext {
        run_id: run_id.clone(),
        fetcher,
        transform: Arc::clone(&deps.transform),
        store: Arc::clone(&deps.store),
        coordinates,
        policy: RetryPolicy::from_run_config(run_config),
        limit_per_page: run_config.limit_per_page,
        stats: ProcessingStats::new(),
    });

    let total_tasks = match run_config.worker_count() {
        Some(workers) => {
            let tasks = build_task_list(
                deps.airports.as_ref(),
                &region,
                &airports,
                run_config.max_pages,
            );
            run_concurrent(&ctx, tasks, workers).await
        }
        None => run_sequential(&ctx, deps.airports.as_ref(), &region, &airports, run_config).await,
    };

    let give_ups = ctx.stats.get_outcome_count(TaskOutcome::GaveUp);
    let records_upserted = ctx.stats.records_upserted();
    let status = if give_ups > run_config.degraded_fail_threshold {
        RunStatus::Degraded
    } else {
        RunStatus::Ok
    };
    let elapsed = started.elapsed();

    match status {
        RunStatus::Ok => info!(
            "{} run {run_id} completed: status=OK tasks={total_tasks} upserted={records_upserted} give_ups={give_ups}",
            app.app_name
        ),
        RunStatus::Degraded => {
            warn!(
                "{} run {run_id} completed: status=DEGRADED tasks={total_tasks} upserted={records_upserted} give_ups={give_ups} (threshold {})",
                app.app_name, run_config.degraded_fail_threshold
            );
            alerts::notify(&format!(
                "{} run {run_id} for region {region} DEGRADED: {give_ups} of {total_tasks} tasks gave up (threshold {})",
                app.app_name, run_config.degraded_fail_threshold
            ))
            .await;
        }
    }
    ctx.stats.log_summary();

    if let Err(e) = deps
        .store
        .finish_run(&RunStats {
            run_id: &run_id,
            total_tasks: total_tasks as i64,
            records_upserted: records_upserted as i64,
            give_ups: give_ups as i64,
            status: status.as_str(),
            elapsed_seconds: elapsed.as_secs_f64(),
        })
        .await
    {
        warn!("Failed to record run statistics: {e}");
    }

    Ok(RunReport {
        run_id,
        region,
        total_tasks,
        records_upserted,
        give_ups,
        status,
        elapsed,
    })
}

async fn run_sequential(
    ctx: &TaskContext,
    directory: &dyn AirportDirectory,
    region: &str,
    airports: &[String],
    run_config: &RunConfig,
) -> usize {
    let mut total_tasks = 0;
    for (index, airport) in airports.iter().enumerate() {
        let pages = page_sequence(directory.start_page(region, index), run_config.max_pages);
        info!(
            "[run={}] Processing airport {airport} (index {index}) pages {pages:?}",
            ctx.run_id
        );

        for (position, &page) in pages.iter().enumerate() {
            let task = Task {
                airport_code: airport.clone(),
                page,
            };
            process_task(ctx, &task).await;
            total_tasks += 1;
            if position + 1 < pages.len() {
                tokio::time::sleep(run_config.page_delay).await;
            }
        }

        if index + 1 < airports.len() {
            tokio::time::sleep(run_config.airport_delay).await;
        }
    }
    total_tasks
}

async fn run_concurrent(ctx: &Arc<TaskContext>, tasks: Vec<Task>, workers: usize) -> usize {
    let total_tasks = tasks.len();
    info!(
        "[run={}] Running {total_tasks} tasks on {workers} workers",
        ctx.run_id
    );

    let semaphore = init_semaphore(workers);
    let mut handles = FuturesUnordered::new();
    for task in tasks {
        let ctx = Arc::clone(ctx);
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            process_task(&ctx, &task).await
        }));
    }

    while let Some(joined) = handles.next().await {
        if let Err(e) = joined {
            error!("[run={}] Ingest task failed to complete: {e}", ctx.run_id);
            ctx.stats.record_outcome(TaskOutcome::GaveUp);
        }
    }
    total_tasks
}

async fn process_task(ctx: &TaskContext, task: &Task) -> TaskOutcome {
    let request = DepartureRequest::new(task.airport_code.clone(), task.page, ctx.limit_per_page);
    let outcome = match fetch_with_fallback(ctx.fetcher.as_ref(), &request, &ctx.policy, &ctx.stats)
        .await
    {
        FetchOutcome::GaveUp { .. } => {
            warn!(
                "[run={}] Gave up on {} page {}",
                ctx.run_id, task.airport_code, task.page
            );
            TaskOutcome::GaveUp
        }
        FetchOutcome::Payload(payload) => {
            let records = ctx
                .transform
                .transform(&payload, &task.airport_code, &ctx.coordinates);
            if records.is_empty() {
                info!(
                    "[run={}] No records returned for {} page {}",
                    ctx.run_id, task.airport_code, task.page
                );
                TaskOutcome::NoRecords
            } else {
                match ctx.store.upsert_flights(&ctx.run_id, &records).await {
                    Ok(count) => {
                        info!(
                            "[run={}] Upserted {count} records for {} page {}",
                            ctx.run_id, task.airport_code, task.page
                        );
                        ctx.stats.add_records_upserted(count);
                        TaskOutcome::Upserted
                    }
                    Err(e) => {
                        error!(
                            "[run={}] Failed to persist {} records for {} page {}: {e}",
                            ctx.run_id,
                            records.len(),
                            task.airport_code,
                            task.page
                        );
                        TaskOutcome::PersistFailed
                    }
                }
            }
        }
    };
    ctx.stats.record_outcome(outcome);
    outcome
}
