//! Logger initialization.
//!
//! This module provides functions to initialize the logger with custom formatting.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Initializes the logger with the specified level and format.
///
/// Configures `env_logger` with custom formatting. Supports both plain text
/// (with colors) and JSON formats for structured logging.
///
/// The logger reads from the `RUST_LOG` environment variable by default, but
/// the provided `level` parameter will override it.
///
/// # Arguments
///
/// * `level` - Minimum log level to display (overrides `RUST_LOG` if set)
/// * `format` - Log format (Plain or Json)
/// * `log_file` - Optional file receiving the log instead of stderr
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Per-module filtering via RUST_LOG
/// RUST_LOG=flight_ingest=debug,reqwest=info flight_ingest JP
/// ```
pub fn init_logger_with(
    level: LevelFilter,
    format: LogFormat,
    log_file: Option<File>,
) -> Result<(), InitializationError> {
    let to_file = log_file.is_some();
    colored::control::set_override(!to_file);

    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("sqlx", LevelFilter::Info);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("hyper_util", LevelFilter::Info);
    builder.filter_module("flight_ingest", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    serde_json::to_string(&record.args().to_string())
                        .unwrap_or_else(|_| "\"\"".into())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };

                writeln!(
                    buf,
                    "{} {} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }

    if let Some(file) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // try_init so tests that initialise twice get an error instead of a panic
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// Creates a per-run log file `<app_name>-<UTC timestamp>.log` in `dir`.
///
/// The directory is created if missing. Characters outside `[A-Za-z0-9_-]` in
/// the app name are replaced so the name is filesystem-safe.
pub fn create_run_log_file(
    dir: &Path,
    app_name: &str,
) -> Result<(File, PathBuf), InitializationError> {
    fs::create_dir_all(dir).map_err(|e| {
        InitializationError::LoggerSetupError(format!(
            "failed to create log directory {}: {e}",
            dir.display()
        ))
    })?;
    let safe_name: String = app_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect();
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    let path = dir.join(format!("{safe_name}-{stamp}.log"));
    let file = File::create(&path).map_err(|e| {
        InitializationError::LoggerSetupError(format!(
            "failed to create log file {}: {e}",
            path.display()
        ))
    })?;
    Ok((file, path))
}
