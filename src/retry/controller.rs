//! Retry-with-fallback state machine: proxy phase, then optional direct phase,
//! then give-up.

use log::{error, warn};
use serde_json::Value;

use crate::api::{DepartureFetcher, DepartureRequest, Route};
use crate::error_handling::{update_error_stats, FetchError, ProcessingStats};
use crate::retry::policy::{retry_delay_for, RetryPolicy};

/// Result of driving one request through the retry policy.
#[derive(Debug)]
pub enum FetchOutcome {
    Payload(Value),
    /// Every attempt failed; the task yields no payload.
    GaveUp {
        attempts: u32,
        last_error: Option<FetchError>,
    },
}

impl FetchOutcome {
    pub fn is_gave_up(&self) -> bool {
        matches!(self, FetchOutcome::GaveUp { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Proxy,
    Direct,
}

impl Phase {
    fn route(self) -> Route {
        match self {
            Phase::Proxy => Route::Auto,
            Phase::Direct => Route::Direct,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Phase::Proxy => "proxy",
            Phase::Direct => "direct",
        }
    }
}

/// What to do after a failed attempt.
enum Next {
    SleepThenRetry,
    /// Skip the sleep and start the direct phase
    DirectNow,
    GiveUp,
}

fn next_step(
    policy: &RetryPolicy,
    phase: Phase,
    is_last_in_phase: bool,
    direct_attempts: u32,
    error: &FetchError,
) -> Next {
    if error.is_caller_error() {
        return Next::GiveUp;
    }
    if !is_last_in_phase {
        return Next::SleepThenRetry;
    }
    match phase {
        Phase::Direct => Next::GiveUp,
        Phase::Proxy if direct_attempts == 0 => Next::GiveUp,
        Phase::Proxy if policy.fallback_on_429() && error.is_rate_limited() => Next::DirectNow,
        Phase::Proxy => Next::SleepThenRetry,
    }
}

/// Fetches one page, retrying per `policy`.
///
/// Proxy-phase attempts use [`Route::Auto`] so each one draws a fresh mapping
/// from the pool; direct-phase attempts force [`Route::Direct`]. Failures are
/// tallied into `stats`. Give-ups are logged, never returned as errors.
pub async fn fetch_with_fallback(
    fetcher: &dyn DepartureFetcher,
    request: &DepartureRequest,
    policy: &RetryPolicy,
    stats: &ProcessingStats,
) -> FetchOutcome {
    let (proxy_attempts, direct_attempts) = policy.phase_split();
    let mut attempts_made = 0;
    let mut last_error = None;

    'phases: for (phase, budget) in [
        (Phase::Proxy, proxy_attempts),
        (Phase::Direct, direct_attempts),
    ] {
        for attempt in 1..=budget {
            attempts_made += 1;
            let error = match fetcher.fetch_departures(request, phase.route()).await {
                Ok(payload) => return FetchOutcome::Payload(payload),
                Err(e) => e,
            };
            update_error_stats(stats, &error);
            warn!(
                "API fetch failed for {} page {} ({} attempt {attempt}/{budget}): {error}",
                request.airport_code,
                request.page,
                phase.as_str()
            );

            let step = next_step(policy, phase, attempt == budget, direct_attempts, &error);
            match step {
                Next::GiveUp => {
                    last_error = Some(error);
                    break 'phases;
                }
                Next::DirectNow => {
                    last_error = Some(error);
                    continue 'phases;
                }
                Next::SleepThenRetry => {
                    tokio::time::sleep(retry_delay_for(&error, policy.base_delay)).await;
                    last_error = Some(error);
                }
            }
        }
    }

    error!(
        "Giving up on airport {} page {} after {attempts_made} attempts",
        request.airport_code, request.page
    );
    FetchOutcome::GaveUp {
        attempts: attempts_made,
        last_error,
    }
}
