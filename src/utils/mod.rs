//! Small shared helpers.

pub mod timing;

pub use timing::{duration_to_ms, timed, PerfSpan};
