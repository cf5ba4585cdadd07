//! Timing instrumentation for the calls that dominate a run.
//!
//! Each timed call logs one structured INFO line:
//!
//! ```text
//! event=perf name=api.fetch_departures duration_ms=182.441 success=true tags={airport=NRT, page=-1, via=proxy}
//! ```

use std::future::Future;
use std::time::Duration;

use log::info;
use tokio::time::Instant;

/// Converts a duration to fractional milliseconds.
pub fn duration_to_ms(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}

/// Running timer for one named operation.
#[derive(Debug)]
pub struct PerfSpan {
    name: &'static str,
    tags: Vec<(&'static str, String)>,
    started: Instant,
}

impl PerfSpan {
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            tags: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Adds a `key=value` pair to the logged tags.
    pub fn tag(mut self, key: &'static str, value: impl ToString) -> Self {
        self.tags.push((key, value.to_string()));
        self
    }

    /// Stops the timer, logs the perf line and returns it.
    pub fn finish(self, success: bool) -> String {
        let line = format!(
            "event=perf name={} duration_ms={:.3} success={} tags={}",
            self.name,
            duration_to_ms(self.started.elapsed()),
            success,
            format_tags(&self.tags)
        );
        info!("{line}");
        line
    }
}

fn format_tags(tags: &[(&'static str, String)]) -> String {
    let items: Vec<String> = tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{{{}}}", items.join(", "))
}

/// Awaits `fut` under `span`; an `Err` is logged as `success=false`.
pub async fn timed<F, T, E>(span: PerfSpan, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    timed_with_line(span, fut).await.0
}

async fn timed_with_line<F, T, E>(span: PerfSpan, fut: F) -> (Result<T, E>, String)
where
    F: Future<Output = Result<T, E>>,
{
    let result = fut.await;
    let line = span.finish(result.is_ok());
    (result, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_to_ms() {
        assert_eq!(duration_to_ms(Duration::ZERO), 0.0);
        assert_eq!(duration_to_ms(Duration::from_micros(1500)), 1.5);
        assert_eq!(duration_to_ms(Duration::from_secs(2)), 2000.0);
    }

    #[test]
    fn test_tags_format() {
        assert_eq!(format_tags(&[]), "{}");
        assert_eq!(
            format_tags(&[("airport", "NRT".into()), ("page", "-1".into())]),
            "{airport=NRT, page=-1}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_call_logs_duration() {
        let span = PerfSpan::start("db.upsert_flights").tag("records", 3);
        let (result, line) = timed_with_line(span, async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            Ok::<_, String>(3)
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(
            line,
            "event=perf name=db.upsert_flights duration_ms=250.000 success=true tags={records=3}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_call_logs_success_false() {
        let span = PerfSpan::start("api.fetch_departures").tag("airport", "NRT");
        let (result, line) = timed_with_line(span, async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            Err::<u32, _>("connection reset")
        })
        .await;

        assert_eq!(result, Err("connection reset"));
        assert!(line.contains("success=false"), "{line}");
        assert!(line.contains("duration_ms=40.000"), "{line}");
        assert!(line.ends_with("tags={airport=NRT}"), "{line}");
    }

    #[tokio::test]
    async fn test_timed_passes_result_through() {
        let value = timed(PerfSpan::start("noop"), async { Ok::<_, ()>("payload") }).await;
        assert_eq!(value, Ok("payload"));
    }
}
