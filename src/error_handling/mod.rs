//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for every module seam
//! - Fetch error categorization
//! - Processing statistics tracking (fetch errors, task outcomes)

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_fetch_error, update_error_stats};
pub use stats::ProcessingStats;
pub use types::{
    AirportListError, AlertError, BoxError, DatabaseError, ErrorType, FetchError,
    InitializationError, ProxyError, RunError, TaskOutcome,
};
