//! Retry policy for departures requests.
//!
//! Attempts are split between a proxy phase and an optional direct phase;
//! 429 responses drive both the sleep length and an early switch to direct.

mod controller;
mod policy;

pub use controller::{fetch_with_fallback, FetchOutcome};
pub use policy::{retry_delay_for, RetryPolicy};
