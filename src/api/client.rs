//! Departures API client.
//!
//! Each request either goes direct or through a proxy mapping drawn from an
//! optional [`ProxySource`]. Transport failures on a proxied request are
//! charged back to the source before the error is returned; HTTP statuses
//! (429 included) never are, since they prove the proxy reached the origin.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, log_enabled, Level};
use reqwest::header::{ACCEPT, RETRY_AFTER};
use serde_json::Value;
use url::Url;

use crate::config::{API_TIMEOUT, DEFAULT_API_BASE_URL, DEFAULT_USER_AGENT, HTTP_STATUS_TOO_MANY_REQUESTS};
use crate::error_handling::{FetchError, InitializationError};
use crate::initialization::{init_client, init_proxied_client};
use crate::proxy::{ProxyMapping, ProxySource};
use crate::utils::{timed, PerfSpan};

/// One page of departures for one airport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureRequest {
    pub airport_code: String,
    /// Non-zero; negative pages reach back into earlier departures
    pub page: i32,
    pub limit: u32,
    /// Optional schedule anchor (epoch seconds)
    pub timestamp: Option<i64>,
}

impl DepartureRequest {
    pub fn new(airport_code: impl Into<String>, page: i32, limit: u32) -> Self {
        Self {
            airport_code: airport_code.into(),
            page,
            limit,
            timestamp: None,
        }
    }

    /// Rejects requests that can never succeed.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidRequest` for an empty code, page 0 or limit 0.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.airport_code.trim().is_empty() {
            return Err(FetchError::InvalidRequest(
                "airport_code must be provided".into(),
            ));
        }
        if self.page == 0 {
            return Err(FetchError::InvalidRequest("page must be != 0".into()));
        }
        if self.limit == 0 {
            return Err(FetchError::InvalidRequest("limit must be positive".into()));
        }
        Ok(())
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("code", self.airport_code.clone()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("plugin[]", "schedule".to_string()),
            ("plugin-setting[schedule][mode]", "departures".to_string()),
        ];
        if let Some(timestamp) = self.timestamp {
            params.push(("plugin-setting[schedule][timestamp]", timestamp.to_string()));
        }
        params
    }
}

/// Routing override for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    /// Use the proxy source when one is configured
    #[default]
    Auto,
    /// Never use a proxy
    Direct,
}

/// Source of departures payloads, the seam between the retry layer and HTTP.
#[async_trait]
pub trait DepartureFetcher: Send + Sync {
    async fn fetch_departures(
        &self,
        request: &DepartureRequest,
        route: Route,
    ) -> Result<Value, FetchError>;
}

/// HTTP client for the airport departures endpoint.
pub struct FlightRadarClient {
    base_url: Url,
    user_agent: String,
    connect_timeout: Duration,
    timeout: Duration,
    direct: reqwest::Client,
    // reqwest binds proxies at build time, so keep one client per proxy URL
    proxied: Mutex<HashMap<String, reqwest::Client>>,
    proxy_source: Option<Arc<dyn ProxySource>>,
}

impl FlightRadarClient {
    /// Direct-only client against the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, InitializationError> {
        Self::with_timeouts(API_TIMEOUT, API_TIMEOUT)
    }

    /// Client with explicit connect and total request timeouts.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError` if the HTTP client cannot be built.
    pub fn with_timeouts(
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, InitializationError> {
        let base_url = Url::parse(DEFAULT_API_BASE_URL)?;
        let direct = init_client(DEFAULT_USER_AGENT, timeout)?;
        Ok(Self {
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout,
            timeout,
            direct,
            proxied: Mutex::new(HashMap::new()),
            proxy_source: None,
        })
    }

    /// Points the client at another endpoint (tests, mirrors).
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Routes `Route::Auto` requests through mappings drawn from `source`.
    pub fn with_proxy_source(mut self, source: Arc<dyn ProxySource>) -> Self {
        self.proxy_source = Some(source);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_proxy_source(&self) -> bool {
        self.proxy_source.is_some()
    }

    fn proxied_client(&self, proxy_url: &str) -> Result<reqwest::Client, FetchError> {
        let mut clients = self.proxied.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(proxy_url) {
            return Ok(client.clone());
        }
        let client = init_proxied_client(
            proxy_url,
            &self.user_agent,
            self.connect_timeout,
            self.timeout,
        )
        .map_err(FetchError::ClientBuild)?;
        clients.insert(proxy_url.to_string(), client.clone());
        Ok(client)
    }

    /// Performs one request through `mapping` (or direct when `None`).
    ///
    /// Nothing is reported to the proxy source here; stage-2 proxy probes use
    /// this before any pool exists.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` for invalid requests, transport failures, 429s,
    /// other non-success statuses and undecodable bodies.
    pub async fn fetch_via(
        &self,
        request: &DepartureRequest,
        mapping: Option<&ProxyMapping>,
    ) -> Result<Value, FetchError> {
        request.validate()?;
        let span = PerfSpan::start("api.fetch_departures")
            .tag("airport", &request.airport_code)
            .tag("page", request.page)
            .tag("via", if mapping.is_some() { "proxy" } else { "direct" });
        timed(span, self.send_request(request, mapping)).await
    }

    async fn send_request(
        &self,
        request: &DepartureRequest,
        mapping: Option<&ProxyMapping>,
    ) -> Result<Value, FetchError> {

        let client = match mapping.and_then(ProxyMapping::url) {
            Some(proxy_url) => self.proxied_client(proxy_url)?,
            None => self.direct.clone(),
        };

        if log_enabled!(Level::Debug) {
            debug!(
                "fetch_departures via={} airport={} page={} proxy={}",
                if mapping.is_some() { "proxy" } else { "direct" },
                request.airport_code,
                request.page,
                mapping.map(ProxyMapping::masked_host).unwrap_or_else(|| "-".into())
            );
        }

        let response = client
            .get(self.base_url.clone())
            .header(ACCEPT, "application/json")
            .query(&request.query())
            .send()
            .await
            .map_err(|e| FetchError::Transport(Box::new(e)))?;

        let status = response.status();
        if status.as_u16() == HTTP_STATUS_TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.trim().to_string());
            debug!(
                "fetch_departures got 429 airport={} page={} retry_after={}",
                request.airport_code,
                request.page,
                retry_after.as_deref().unwrap_or("-")
            );
            return Err(FetchError::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(Box::new(e)))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(Box::new(e)))
    }
}

#[async_trait]
impl DepartureFetcher for FlightRadarClient {
    async fn fetch_departures(
        &self,
        request: &DepartureRequest,
        route: Route,
    ) -> Result<Value, FetchError> {
        // Drawing a mapping never waits on the pool; None just means direct.
        let mapping = match (route, &self.proxy_source) {
            (Route::Auto, Some(source)) => source.next_proxy(),
            _ => None,
        };

        let result = self.fetch_via(request, mapping.as_ref()).await;
        if let (Err(FetchError::Transport(_)), Some(mapping), Some(source)) =
            (&result, &mapping, &self.proxy_source)
        {
            source.report_failure(mapping);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_caller_errors() {
        for request in [
            DepartureRequest::new("", 1, 100),
            DepartureRequest::new("  ", 1, 100),
            DepartureRequest::new("NRT", 0, 100),
            DepartureRequest::new("NRT", 1, 0),
        ] {
            let err = request.validate().expect_err("should be rejected");
            assert!(err.is_caller_error(), "{request:?}");
        }
        assert!(DepartureRequest::new("NRT", -2, 100).validate().is_ok());
    }

    #[test]
    fn test_query_params() {
        let mut request = DepartureRequest::new("HND", -1, 50);
        let query = request.query();
        assert!(query.contains(&("code", "HND".to_string())));
        assert!(query.contains(&("page", "-1".to_string())));
        assert!(query.contains(&("limit", "50".to_string())));
        assert!(query.contains(&("plugin[]", "schedule".to_string())));
        assert!(query.contains(&("plugin-setting[schedule][mode]", "departures".to_string())));
        assert_eq!(query.len(), 5);

        request.timestamp = Some(1_700_000_000);
        assert!(request
            .query()
            .contains(&("plugin-setting[schedule][timestamp]", "1700000000".to_string())));
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_io() {
        // Unroutable base URL: any network attempt would surface as Transport.
        let client = FlightRadarClient::new()
            .expect("client")
            .with_base_url(Url::parse("http://127.0.0.1:1/airport.json").expect("url"));
        let err = client
            .fetch_departures(&DepartureRequest::new("", 1, 10), Route::Auto)
            .await
            .expect_err("caller error");
        assert!(err.is_caller_error());
    }
}
