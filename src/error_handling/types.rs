//! Error type definitions.
//!
//! This module defines the error enums used at every module seam, plus the
//! categories tracked by run statistics.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Boxed error used where the concrete source type varies (reqwest in
/// production, plain messages in test doubles).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the logger with custom message (e.g., file creation).
    #[error("Logger initialization error: {0}")]
    LoggerSetupError(String),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Invalid API base URL.
    #[error("Invalid base URL: {0}")]
    UrlError(#[from] url::ParseError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

/// Failure of a single departures request.
///
/// The variants mirror how the retry controller reacts: caller errors are
/// never retried, transport failures are retried and charged to the proxy
/// that carried them, rate limits carry the server's retry hint.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Invalid request parameters, rejected before any network I/O.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Connection, timeout or other transport-level failure.
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// HTTP 429 with the raw `Retry-After` header value, if any.
    #[error("Rate limited (429), retry-after: {}", retry_after.as_deref().unwrap_or("none"))]
    RateLimited { retry_after: Option<String> },

    /// Any other non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Response body was not valid JSON.
    #[error("Decode error: {0}")]
    Decode(#[source] BoxError),

    /// A per-proxy HTTP client could not be constructed.
    #[error("HTTP client build error: {0}")]
    ClientBuild(#[source] ReqwestError),
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }

    pub fn is_caller_error(&self) -> bool {
        matches!(self, FetchError::InvalidRequest(_))
    }

    /// Raw Retry-After hint of a 429 response.
    pub fn retry_after(&self) -> Option<&str> {
        match self {
            FetchError::RateLimited { retry_after } => retry_after.as_deref(),
            _ => None,
        }
    }
}

/// Errors raised while assembling a proxy pool.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The candidate list could not be downloaded.
    #[error("Proxy list fetch error: {0}")]
    ListFetch(#[from] ReqwestError),

    /// The candidate list endpoint answered with a non-success status.
    #[error("Proxy list endpoint returned HTTP {0}")]
    ListStatus(u16),
}

impl ProxyError {
    /// Worth another download attempt: transport failures, 5xx and 429.
    pub fn is_transient(&self) -> bool {
        match self {
            ProxyError::ListFetch(_) => true,
            ProxyError::ListStatus(code) => *code >= 500 || *code == 429,
        }
    }
}

/// Errors raised while loading an airport list.
#[derive(Error, Debug)]
pub enum AirportListError {
    #[error("Region must be a non-empty string")]
    EmptyRegion,

    #[error("Airport list not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Airport list read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-level failures surfaced by `run_job`.
///
/// Per-task failures never appear here; they are counted and logged.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Invalid run configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Airports(#[from] AirportListError),
}

/// Errors from the Telegram alerting client.
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Telegram request failed: {0}")]
    Http(#[from] ReqwestError),

    #[error("Telegram rejected message: {0}")]
    Rejected(String),
}

/// Categories of fetch failures tracked during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    InvalidRequest,
    TransportTimeout,
    TransportConnect,
    TransportOther,
    RateLimited,
    HttpClientError,
    HttpServerError,
    DecodeError,
    ClientBuildError,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::InvalidRequest => "Invalid request",
            ErrorType::TransportTimeout => "Transport timeout",
            ErrorType::TransportConnect => "Transport connect error",
            ErrorType::TransportOther => "Transport error",
            ErrorType::RateLimited => "Too many requests (429)",
            ErrorType::HttpClientError => "HTTP client error (4xx)",
            ErrorType::HttpServerError => "HTTP server error (5xx)",
            ErrorType::DecodeError => "Response decode error",
            ErrorType::ClientBuildError => "HTTP client build error",
        }
    }
}

/// Final state of one (airport, page) task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum TaskOutcome {
    /// Records were written to the store
    Upserted,
    /// Payload arrived but held no departures
    NoRecords,
    /// Every retry/fallback attempt failed
    GaveUp,
    /// Payload arrived but persisting it failed
    PersistFailed,
}

impl TaskOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Upserted => "upserted",
            TaskOutcome::NoRecords => "no records",
            TaskOutcome::GaveUp => "gave up",
            TaskOutcome::PersistFailed => "persist failed",
        }
    }
}
