//! Retry budget and sleep computation.

use std::time::Duration;

use crate::config::{ProxyFallback, RunConfig, RATE_LIMIT_FALLBACK_DELAY};
use crate::error_handling::FetchError;

/// Attempt budget for one task, optionally split into proxy and direct phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts across both phases
    pub attempts: u32,
    /// Sleep after an ordinary failure
    pub base_delay: Duration,
    pub fallback: Option<ProxyFallback>,
}

impl RetryPolicy {
    pub fn from_run_config(run_config: &RunConfig) -> Self {
        Self {
            attempts: run_config.retry_attempts,
            base_delay: run_config.retry_delay,
            fallback: run_config.proxy_fallback,
        }
    }

    /// `(proxy_attempts, direct_attempts)`.
    ///
    /// Without an enabled fallback every attempt belongs to the proxy phase.
    /// The direct share never exceeds the total budget.
    ///
    /// ```
    /// use std::time::Duration;
    /// use flight_ingest::retry::RetryPolicy;
    /// use flight_ingest::ProxyFallback;
    ///
    /// let policy = RetryPolicy {
    ///     attempts: 3,
    ///     base_delay: Duration::from_secs(2),
    ///     fallback: Some(ProxyFallback::default()),
    /// };
    /// assert_eq!(policy.phase_split(), (2, 1));
    /// ```
    pub fn phase_split(&self) -> (u32, u32) {
        match self.fallback {
            Some(fallback) if fallback.enabled => {
                let direct = fallback.direct_attempts.min(self.attempts);
                (self.attempts - direct, direct)
            }
            _ => (self.attempts, 0),
        }
    }

    /// Whether a 429 on the last proxy attempt skips straight to direct.
    pub fn fallback_on_429(&self) -> bool {
        self.fallback
            .is_some_and(|fallback| fallback.enabled && fallback.fallback_on_429)
    }
}

/// Sleep before the next attempt after `error`.
///
/// A 429 with a numeric `Retry-After` sleeps exactly that many seconds; a 429
/// without a usable hint sleeps `max(2 * base, 30s)`; everything else sleeps
/// `base`.
pub fn retry_delay_for(error: &FetchError, base: Duration) -> Duration {
    if !error.is_rate_limited() {
        return base;
    }
    match error.retry_after().and_then(parse_retry_after) {
        Some(delay) => delay,
        None => (base * 2).max(RATE_LIMIT_FALLBACK_DELAY),
    }
}

/// Retry-After in delta-seconds form. HTTP-date values are not honoured.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds = value.trim().parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limited(hint: Option<&str>) -> FetchError {
        FetchError::RateLimited {
            retry_after: hint.map(str::to_string),
        }
    }

    #[test]
    fn test_phase_split() {
        let mut policy = RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_secs(2),
            fallback: None,
        };
        assert_eq!(policy.phase_split(), (3, 0));

        policy.fallback = Some(ProxyFallback {
            enabled: false,
            direct_attempts: 1,
            fallback_on_429: true,
        });
        assert_eq!(policy.phase_split(), (3, 0));
        assert!(!policy.fallback_on_429());

        policy.fallback = Some(ProxyFallback::default());
        assert_eq!(policy.phase_split(), (2, 1));
        assert!(policy.fallback_on_429());

        policy.fallback = Some(ProxyFallback {
            enabled: true,
            direct_attempts: 5,
            fallback_on_429: false,
        });
        assert_eq!(policy.phase_split(), (0, 3));
    }

    #[test]
    fn test_delay_honours_retry_after() {
        let base = Duration::from_secs(2);
        assert_eq!(
            retry_delay_for(&limited(Some("15")), base),
            Duration::from_secs(15)
        );
        assert_eq!(
            retry_delay_for(&limited(Some(" 1.5 ")), base),
            Duration::from_millis(1500)
        );
        // long hints are honoured in full
        assert_eq!(
            retry_delay_for(&limited(Some("900")), base),
            Duration::from_secs(900)
        );
        assert_eq!(
            retry_delay_for(&limited(Some("86400")), base),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn test_delay_without_usable_hint() {
        let base = Duration::from_secs(2);
        for hint in [None, Some("soon"), Some("-3"), Some("Wed, 21 Oct 2015 07:28:00 GMT")] {
            assert_eq!(
                retry_delay_for(&limited(hint), base),
                RATE_LIMIT_FALLBACK_DELAY,
                "{hint:?}"
            );
        }
        assert_eq!(
            retry_delay_for(&limited(None), Duration::from_secs(20)),
            Duration::from_secs(40)
        );
    }

    #[test]
    fn test_delay_for_other_failures_is_base() {
        let base = Duration::from_millis(750);
        assert_eq!(retry_delay_for(&FetchError::Status(503), base), base);
        assert_eq!(
            retry_delay_for(&FetchError::Transport("reset".into()), base),
            base
        );
    }
}
