//! Validated proxy pool: two-stage build pipeline plus runtime rotation and
//! failure eviction.
//!
//! The pool is shared by every ingest worker, so the rotation cursor and the
//! failure counters live behind one mutex. Locks are held only for the
//! bookkeeping itself, never across an `.await`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use rand::seq::IndexedRandom;

use crate::config::{ProxyBuildOptions, ProxyStrategy, PROXY_LIST_TIMEOUT};
use crate::error_handling::ProxyError;
use crate::initialization::init_semaphore;
use crate::proxy::endpoint::{ProxyEndpoint, ProxyMapping};
use crate::proxy::probe::{
    validate_proxy_custom, validate_proxy_generic, ProxyProbe, TargetProbe,
};
use crate::proxy::source::fetch_proxy_list;

/// Something that hands out proxy mappings and takes failure reports back.
///
/// The fetch client only sees this seam, so tests can substitute a fixed
/// source and a scheduler could plug in a different pool.
pub trait ProxySource: Send + Sync {
    /// Mapping for the next request, or `None` to go direct.
    fn next_proxy(&self) -> Option<ProxyMapping>;

    /// Charges a transport failure to the endpoint behind `mapping`.
    fn report_failure(&self, mapping: &ProxyMapping);
}

#[derive(Debug, Default)]
struct PoolState {
    endpoints: Vec<ProxyEndpoint>,
    failures: HashMap<ProxyEndpoint, u32>,
    cursor: usize,
}

/// Rotating, failure-evicting set of proxy endpoints.
///
/// An endpoint whose failure count reaches `max_failures` is removed from
/// rotation for the lifetime of the pool; its counter is kept.
#[derive(Debug)]
pub struct ProxyPool {
    state: Mutex<PoolState>,
    max_failures: u32,
    strategy: ProxyStrategy,
}

/// Per-stage candidate counts from [`ProxyPool::build`].
///
/// `stage2` counts the survivors actually kept after the latency cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildCounts {
    pub fetched: usize,
    pub stage1: usize,
    pub stage2: usize,
}

/// Result of [`ProxyPool::build`].
#[derive(Debug)]
pub struct ProxyPoolBuild {
    pub pool: ProxyPool,
    /// Kept survivors, fastest first
    pub survivors: Vec<ProxyEndpoint>,
    pub counts: BuildCounts,
    /// Stage-2 passes before the latency cap
    pub stage2_passed: usize,
}

impl ProxyPool {
    /// Creates a pool rotating over `endpoints` in the given order.
    ///
    /// `max_failures` is clamped to at least 1.
    pub fn new(
        endpoints: impl IntoIterator<Item = ProxyEndpoint>,
        max_failures: u32,
        strategy: ProxyStrategy,
    ) -> Self {
        Self {
            state: Mutex::new(PoolState {
                endpoints: endpoints.into_iter().collect(),
                ..Default::default()
            }),
            max_failures: max_failures.max(1),
            strategy,
        }
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_empty(&self) -> bool {
        self.state().endpoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state().endpoints.len()
    }

    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    pub fn strategy(&self) -> ProxyStrategy {
        self.strategy
    }

    /// Snapshot of the endpoints currently in rotation.
    pub fn endpoints(&self) -> Vec<ProxyEndpoint> {
        self.state().endpoints.clone()
    }

    pub fn failure_count(&self, endpoint: &ProxyEndpoint) -> u32 {
        self.state().failures.get(endpoint).copied().unwrap_or(0)
    }

    /// Picks the mapping for the next request; `None` when the pool is empty.
    ///
    /// Round-robin wraps against the current length on every call, since
    /// eviction can shrink the list between calls.
    pub fn get_proxies_for_request(&self) -> Option<ProxyMapping> {
        let mut state = self.state();
        if state.endpoints.is_empty() {
            return None;
        }
        let endpoint = match self.strategy {
            ProxyStrategy::Random => state.endpoints.choose(&mut rand::rng())?,
            ProxyStrategy::RoundRobin => {
                let index = state.cursor % state.endpoints.len();
                state.cursor = state.cursor.wrapping_add(1);
                &state.endpoints[index]
            }
        };
        Some(endpoint.mapping())
    }

    /// Counts a failure against the endpoint behind `mapping`, evicting it at
    /// the threshold.
    ///
    /// Malformed mappings and endpoints already at the threshold are ignored.
    pub fn report_failure(&self, mapping: &ProxyMapping) {
        let Some(endpoint) = mapping.endpoint() else {
            debug!("Ignoring failure report for unparseable proxy mapping");
            return;
        };
        let mut state = self.state();
        let count = state.failures.entry(endpoint.clone()).or_insert(0);
        if *count >= self.max_failures {
            return;
        }
        *count += 1;
        let count = *count;
        if count >= self.max_failures {
            state.endpoints.retain(|e| e != &endpoint);
            info!(
                "Evicted proxy {} after {count} failures ({} left)",
                mapping.masked_host(),
                state.endpoints.len()
            );
        } else {
            debug!(
                "Proxy {} failure {count}/{}",
                mapping.masked_host(),
                self.max_failures
            );
        }
    }

    /// Fetches candidates, validates them in two stages and builds a pool from
    /// the fastest survivors.
    ///
    /// An empty candidate list yields an empty pool with zero counts.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError` only when the candidate list cannot be downloaded.
    pub async fn build(
        options: &ProxyBuildOptions,
        stage2: Arc<dyn TargetProbe>,
    ) -> Result<ProxyPoolBuild, ProxyError> {
        let list_client = reqwest::Client::builder()
            .timeout(PROXY_LIST_TIMEOUT)
            .build()?;
        let candidates =
            fetch_proxy_list(&list_client, &options.source_url, options.fetch_limit).await?;
        let fetched = candidates.len();
        if candidates.is_empty() {
            warn!("Proxy source returned no usable candidates");
            return Ok(ProxyPoolBuild {
                pool: ProxyPool::new(Vec::new(), options.max_failures, options.strategy),
                survivors: Vec::new(),
                counts: BuildCounts::default(),
                stage2_passed: 0,
            });
        }

        let stage1_url = options.stage1_url.clone();
        let connect_timeout = options.connect_timeout;
        let read_timeout = options.read_timeout;
        let threshold = options.latency_threshold_ms;
        let stage1 = run_stage(candidates, options.max_workers, move |endpoint| {
            let url = stage1_url.clone();
            async move {
                validate_proxy_generic(endpoint, &url, connect_timeout, read_timeout, threshold)
                    .await
            }
        })
        .await;
        let stage1_ok: Vec<ProxyEndpoint> = stage1
            .into_iter()
            .filter(|probe| probe.success)
            .map(|probe| probe.endpoint)
            .collect();
        info!("Proxy stage 1: {}/{fetched} passed", stage1_ok.len());

        let stage1_count = stage1_ok.len();
        let stage2_results = run_stage(stage1_ok, options.max_workers, move |endpoint| {
            let probe = Arc::clone(&stage2);
            async move { validate_proxy_custom(endpoint, probe.as_ref()).await }
        })
        .await;
        let stage2_passed = stage2_results.iter().filter(|probe| probe.success).count();
        let survivors = rank_survivors(stage2_results, options.survivors_max);
        info!(
            "Proxy stage 2: {stage2_passed}/{stage1_count} passed, keeping {}",
            survivors.len()
        );

        let counts = BuildCounts {
            fetched,
            stage1: stage1_count,
            stage2: survivors.len(),
        };
        Ok(ProxyPoolBuild {
            pool: ProxyPool::new(survivors.clone(), options.max_failures, options.strategy),
            survivors,
            counts,
            stage2_passed,
        })
    }
}

impl ProxySource for ProxyPool {
    fn next_proxy(&self) -> Option<ProxyMapping> {
        self.get_proxies_for_request()
    }

    fn report_failure(&self, mapping: &ProxyMapping) {
        ProxyPool::report_failure(self, mapping);
    }
}

/// Keeps successful probes, fastest first, capped at `max(1, survivors_max)`.
pub fn rank_survivors(probes: Vec<ProxyProbe>, survivors_max: usize) -> Vec<ProxyEndpoint> {
    let mut passed: Vec<ProxyProbe> = probes.into_iter().filter(|probe| probe.success).collect();
    passed.sort_by(|a, b| a.latency_ms.total_cmp(&b.latency_ms));
    passed
        .into_iter()
        .take(survivors_max.max(1))
        .map(|probe| probe.endpoint)
        .collect()
}

/// Runs `worker` for every endpoint with at most `max_workers` in flight.
///
/// A worker that panics is recorded as a failed `WorkerError` probe.
async fn run_stage<F, Fut>(
    endpoints: Vec<ProxyEndpoint>,
    max_workers: usize,
    worker: F,
) -> Vec<ProxyProbe>
where
    F: Fn(ProxyEndpoint) -> Fut,
    Fut: Future<Output = ProxyProbe> + Send + 'static,
{
    let semaphore = init_semaphore(max_workers);
    let mut tasks = FuturesUnordered::new();
    for endpoint in endpoints {
        let probe = worker(endpoint.clone());
        let semaphore = Arc::clone(&semaphore);
        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            probe.await
        });
        tasks.push(async move { (endpoint, handle.await) });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some((endpoint, joined)) = tasks.next().await {
        match joined {
            Ok(probe) => results.push(probe),
            Err(e) => {
                warn!("Proxy probe worker for {endpoint} failed: {e}");
                results.push(ProxyProbe::worker_error(endpoint, e.to_string()));
            }
        }
    }
    results
}
