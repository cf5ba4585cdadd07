//! Processing statistics tracking.
//!
//! This module provides thread-safe statistics tracking for fetch errors and
//! task outcomes during an ingest run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::{ErrorType, TaskOutcome};

/// Thread-safe processing statistics tracker.
///
/// Tracks per-attempt fetch errors and per-task outcomes using atomic
/// counters, so concurrent workers can share one instance behind an `Arc`.
/// All keys are initialized to zero on creation.
pub struct ProcessingStats {
    errors: HashMap<ErrorType, AtomicUsize>,
    outcomes: HashMap<TaskOutcome, AtomicUsize>,
    records_upserted: AtomicUsize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }

        let mut outcomes = HashMap::new();
        for outcome in TaskOutcome::iter() {
            outcomes.insert(outcome, AtomicUsize::new(0));
        }

        ProcessingStats {
            errors,
            outcomes,
            records_upserted: AtomicUsize::new(0),
        }
    }

    /// Increment an error counter.
    pub fn increment_error(&self, error: ErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment error counter for {:?} which is not in the map. \
                 This indicates a bug in ProcessingStats initialization.",
                error
            );
        }
    }

    /// Record the final outcome of a task.
    pub fn record_outcome(&self, outcome: TaskOutcome) {
        if let Some(counter) = self.outcomes.get(&outcome) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to record outcome {:?} which is not in the map. \
                 This indicates a bug in ProcessingStats initialization.",
                outcome
            );
        }
    }

    pub fn add_records_upserted(&self, count: usize) {
        self.records_upserted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn get_error_count(&self, error: ErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn get_outcome_count(&self, outcome: TaskOutcome) -> usize {
        self.outcomes
            .get(&outcome)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn records_upserted(&self) -> usize {
        self.records_upserted.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> usize {
        self.errors.values().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    pub fn total_tasks(&self) -> usize {
        self.outcomes
            .values()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Logs non-zero counters at info level.
    pub fn log_summary(&self) {
        let mut outcomes: Vec<(TaskOutcome, usize)> = TaskOutcome::iter()
            .map(|o| (o, self.get_outcome_count(o)))
            .filter(|(_, count)| *count > 0)
            .collect();
        outcomes.sort_by(|a, b| b.1.cmp(&a.1));
        for (outcome, count) in outcomes {
            log::info!("   Tasks {}: {}", outcome.as_str(), count);
        }

        let total_errors = self.total_errors();
        if total_errors == 0 {
            return;
        }
        log::info!("Fetch errors across all attempts: {}", total_errors);
        let mut errors: Vec<(ErrorType, usize)> = ErrorType::iter()
            .map(|e| (e, self.get_error_count(e)))
            .filter(|(_, count)| *count > 0)
            .collect();
        errors.sort_by(|a, b| b.1.cmp(&a.1));
        for (error, count) in errors {
            log::info!("   {}: {}", error, count);
        }
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
