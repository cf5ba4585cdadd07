//! Proxy probes.
//!
//! Stage 1 is a generic reachability/latency check against a neutral URL.
//! Stage 2 delegates to a caller-supplied [`TargetProbe`] that exercises the
//! real origin, since many public proxies pass generic checks but are blocked
//! by specific sites.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::time::Instant;

use crate::config::{DEFAULT_USER_AGENT, STAGE1_ACCEPT_STATUS};
use crate::initialization::init_proxied_client;
use crate::proxy::endpoint::{ProxyEndpoint, ProxyMapping};

/// Which validation step produced a probe record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Generic,
    Custom,
    /// The probe task itself failed (panicked or was cancelled)
    WorkerError,
}

impl ProbeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStage::Generic => "generic",
            ProbeStage::Custom => "custom",
            ProbeStage::WorkerError => "worker-error",
        }
    }
}

/// Outcome of testing one endpoint against one target.
///
/// `latency_ms` is `f64::INFINITY` whenever no response was observed, so
/// failed probes always sort after successful ones.
#[derive(Debug, Clone)]
pub struct ProxyProbe {
    pub endpoint: ProxyEndpoint,
    pub success: bool,
    pub status_code: Option<u16>,
    pub latency_ms: f64,
    pub error: Option<String>,
    pub stage: ProbeStage,
}

impl ProxyProbe {
    /// Failed probe with no observed response.
    pub fn failed(endpoint: ProxyEndpoint, stage: ProbeStage, error: impl Into<String>) -> Self {
        Self {
            endpoint,
            success: false,
            status_code: None,
            latency_ms: f64::INFINITY,
            error: Some(error.into()),
            stage,
        }
    }

    /// Record for a probe task that died before producing a result.
    pub fn worker_error(endpoint: ProxyEndpoint, error: impl Into<String>) -> Self {
        Self::failed(endpoint, ProbeStage::WorkerError, error)
    }
}

/// Verdict returned by a target-specific probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeVerdict {
    pub ok: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

/// Target-specific stage-2 check, run once per stage-1 survivor.
///
/// Implementations route their request through `mapping`. Returning `Err`
/// marks the endpoint as failed; it never aborts the stage.
#[async_trait]
pub trait TargetProbe: Send + Sync {
    async fn probe(&self, mapping: &ProxyMapping) -> anyhow::Result<ProbeVerdict>;
}

/// Stage-1 probe: GET `url` through `endpoint`.
///
/// Succeeds iff the status is in [`STAGE1_ACCEPT_STATUS`] and, when a
/// threshold is given, the observed latency is at or under it.
pub async fn validate_proxy_generic(
    endpoint: ProxyEndpoint,
    url: &str,
    connect_timeout: Duration,
    read_timeout: Duration,
    latency_threshold_ms: Option<f64>,
) -> ProxyProbe {
    let client = match init_proxied_client(
        &endpoint.as_url(),
        DEFAULT_USER_AGENT,
        connect_timeout,
        connect_timeout + read_timeout,
    ) {
        Ok(client) => client,
        Err(e) => return ProxyProbe::failed(endpoint, ProbeStage::Generic, e.to_string()),
    };

    let started = Instant::now();
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(
                "Stage-1 probe via {} failed: {e}",
                endpoint.mapping().masked_host()
            );
            return ProxyProbe::failed(endpoint, ProbeStage::Generic, e.to_string());
        }
    };
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
    let status = response.status().as_u16();

    let status_ok = STAGE1_ACCEPT_STATUS.contains(&status);
    let latency_ok = match latency_threshold_ms {
        Some(threshold) => latency_ms <= threshold,
        None => true,
    };
    let error = if !status_ok {
        Some(format!("unexpected status {status}"))
    } else if !latency_ok {
        Some(format!("latency {latency_ms:.0}ms over threshold"))
    } else {
        None
    };

    ProxyProbe {
        endpoint,
        success: status_ok && latency_ok,
        status_code: Some(status),
        latency_ms,
        error,
        stage: ProbeStage::Generic,
    }
}

/// Stage-2 probe: hand the endpoint's mapping to the caller's probe.
pub async fn validate_proxy_custom(endpoint: ProxyEndpoint, probe: &dyn TargetProbe) -> ProxyProbe {
    let mapping = endpoint.mapping();
    let started = Instant::now();
    match probe.probe(&mapping).await {
        Ok(verdict) => {
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
            ProxyProbe {
                endpoint,
                success: verdict.ok,
                status_code: verdict.status_code,
                latency_ms: if verdict.ok { latency_ms } else { f64::INFINITY },
                error: verdict.error,
                stage: ProbeStage::Custom,
            }
        }
        Err(e) => ProxyProbe::failed(endpoint, ProbeStage::Custom, format!("{e:#}")),
    }
}
