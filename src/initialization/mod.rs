//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger (stderr or per-run file)
//! - HTTP clients (direct and proxied)
//! - Worker semaphores
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

use std::sync::Arc;

use tokio::sync::Semaphore;

// Re-export public API
pub use client::{init_client, init_proxied_client};
pub use logger::{create_run_log_file, init_logger_with};

/// Initializes a semaphore for controlling concurrency.
///
/// Used to bound both proxy probes and concurrent ingest workers.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count.max(1)))
}
