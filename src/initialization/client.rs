//! HTTP client initialization.
//!
//! reqwest binds proxies at client construction, so proxied traffic uses one
//! client per proxy URL while direct traffic shares a single client.

use std::time::Duration;

use reqwest::ClientBuilder;

/// Initializes the direct (unproxied) HTTP client.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(user_agent)
        .no_proxy()
        .build()
}

/// Initializes a client that routes every request through `proxy_url`.
///
/// `connect_timeout` bounds the TCP connect to the proxy; `timeout` bounds the
/// whole request including the read.
///
/// # Errors
///
/// Returns a `reqwest::Error` if the proxy URL is invalid or client creation fails.
pub fn init_proxied_client(
    proxy_url: &str,
    user_agent: &str,
    connect_timeout: Duration,
    timeout: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .proxy(reqwest::Proxy::all(proxy_url)?)
        .connect_timeout(connect_timeout)
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}
