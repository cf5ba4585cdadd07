//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, API endpoints)
//! - Library configuration types (`AppConfig`, `RunConfig`, proxy options)
//! - CLI option parsing (`Opt`)

mod constants;
mod opt;
mod types;

pub use constants::*;
pub use opt::Opt;
pub use types::{
    AppConfig, LogFormat, LogLevel, ProxyBuildOptions, ProxyFallback, ProxyStrategy, RunConfig,
};
