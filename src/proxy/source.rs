//! Candidate proxy list download and parsing.

use std::collections::HashSet;
use std::time::Duration;

use log::{debug, info};
use rand::seq::SliceRandom;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;

use crate::config::{PROXY_LIST_FETCH_ATTEMPTS, PROXY_LIST_RETRY_INITIAL_DELAY_MS};
use crate::error_handling::ProxyError;
use crate::proxy::endpoint::ProxyEndpoint;

/// Parses a `host:port` per line list, dropping invalid lines and duplicates.
///
/// The first occurrence of each `(host, port)` wins.
pub fn parse_proxy_list(text: &str) -> Vec<ProxyEndpoint> {
    let mut seen = HashSet::new();
    text.lines()
        .filter_map(ProxyEndpoint::parse_line)
        .filter(|endpoint| seen.insert(endpoint.clone()))
        .collect()
}

/// Delays between list download attempts: 500ms, 1s, 2s, ...
fn list_retry_strategy() -> impl Iterator<Item = Duration> {
    // tokio-retry yields base^n * factor
    ExponentialBackoff::from_millis(2)
        .factor(PROXY_LIST_RETRY_INITIAL_DELAY_MS / 2)
        .max_delay(Duration::from_secs(5))
        .take(PROXY_LIST_FETCH_ATTEMPTS.saturating_sub(1))
}

/// Downloads the candidate list, dedupes it, shuffles it and caps it to `limit`.
///
/// A `limit` of 0 disables the cap. Transient failures (transport errors,
/// 5xx, 429) are retried with exponential backoff.
///
/// # Errors
///
/// Returns `ProxyError` when every download attempt fails.
pub async fn fetch_proxy_list(
    client: &reqwest::Client,
    url: &str,
    limit: usize,
) -> Result<Vec<ProxyEndpoint>, ProxyError> {
    let text = RetryIf::start(
        list_retry_strategy(),
        || {
            let client = client.clone();
            let url = url.to_string();
            async move {
                let response = client.get(&url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    debug!("Proxy list {url} answered HTTP {status}");
                    return Err(ProxyError::ListStatus(status.as_u16()));
                }
                Ok(response.text().await?)
            }
        },
        ProxyError::is_transient,
    )
    .await?;

    let mut candidates = parse_proxy_list(&text);
    let unique = candidates.len();
    candidates.shuffle(&mut rand::rng());
    if limit > 0 {
        candidates.truncate(limit);
    }
    info!(
        "Fetched {} proxy candidates ({unique} unique, limit {limit})",
        candidates.len()
    );
    Ok(candidates)
}
