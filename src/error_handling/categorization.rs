//! Error categorization.
//!
//! Maps fetch failures onto the `ErrorType` buckets used by run statistics.

use super::stats::ProcessingStats;
use super::types::{ErrorType, FetchError};

/// Categorizes a `FetchError` into an `ErrorType`.
///
/// Transport failures are inspected through their source chain: when a
/// `reqwest::Error` is found, its timeout/connect flags pick the bucket.
pub fn categorize_fetch_error(error: &FetchError) -> ErrorType {
    match error {
        FetchError::InvalidRequest(_) => ErrorType::InvalidRequest,
        FetchError::RateLimited { .. } => ErrorType::RateLimited,
        FetchError::Status(code) if (500..600).contains(code) => ErrorType::HttpServerError,
        FetchError::Status(_) => ErrorType::HttpClientError,
        FetchError::Decode(_) => ErrorType::DecodeError,
        FetchError::ClientBuild(_) => ErrorType::ClientBuildError,
        FetchError::Transport(source) => {
            let first: &(dyn std::error::Error + 'static) = source.as_ref();
            let mut cause = Some(first);
            while let Some(err) = cause {
                if let Some(reqwest_err) = err.downcast_ref::<reqwest::Error>() {
                    if reqwest_err.is_timeout() {
                        return ErrorType::TransportTimeout;
                    }
                    if reqwest_err.is_connect() {
                        return ErrorType::TransportConnect;
                    }
                }
                cause = err.source();
            }
            ErrorType::TransportOther
        }
    }
}

/// Records a fetch failure in the run statistics.
pub fn update_error_stats(stats: &ProcessingStats, error: &FetchError) {
    stats.increment_error(categorize_fetch_error(error));
}
