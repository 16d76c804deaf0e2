use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::*;

#[derive(Debug, Clone, Copy)]
enum Step {
    Rate(f64),
    /// Answers after a short delay.
    Slow(f64),
    Fail,
    Hang,
}

/// Replays `steps` in order; the last step repeats forever.
struct ScriptedSource {
    calls: AtomicUsize,
    steps: std::sync::Mutex<Vec<Step>>,
}

impl ScriptedSource {
    fn new(steps: &[Step]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            steps: std::sync::Mutex::new(steps.to_vec()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RateSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_rate(&self) -> Result<f64, ScraperError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut steps = self.steps.lock().unwrap();
            if steps.len() > 1 {
                steps.remove(0)
            } else {
                steps[0]
            }
        };
        match step {
            Step::Rate(rate) => Ok(rate),
            Step::Slow(rate) => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(rate)
            }
            Step::Fail => Err(ScraperError::RateNotFound {
                url: "scripted".to_owned(),
            }),
            Step::Hang => std::future::pending().await,
        }
    }
}

fn settings(ttl: Duration, failure_ttl: Duration) -> RateSettings {
    RateSettings {
        ttl,
        failure_ttl,
        timeout: Duration::from_millis(100),
        fallback: 54.50,
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn repeated_calls_within_ttl_hit_the_cache() {
    let provider = RateProvider::new(
        ScriptedSource::new(&[Step::Rate(36.5)]),
        settings(Duration::from_secs(3600), Duration::from_secs(60)),
    );

    let first = provider.quote().await;
    let second = provider.quote().await;
    let third = provider.get_rate().await;

    assert_eq!(first.origin, RateOrigin::Live);
    assert_eq!(second.origin, RateOrigin::Cached);
    assert_close(third, 36.5);
    assert_eq!(provider.source.calls(), 1);
}

#[tokio::test]
async fn hanging_upstream_returns_fallback_within_timeout() {
    let provider = RateProvider::new(
        ScriptedSource::new(&[Step::Hang]),
        settings(Duration::from_secs(3600), Duration::from_secs(60)),
    );

    let started = Instant::now();
    let quote = provider.quote().await;
    let elapsed = started.elapsed();

    assert_close(quote.rate, 54.50);
    assert_eq!(quote.origin, RateOrigin::Fallback);
    assert!(
        elapsed < Duration::from_secs(2),
        "fallback took {elapsed:?}, expected roughly the 100ms timeout"
    );
}

#[tokio::test]
async fn failing_upstream_returns_fallback() {
    let provider = RateProvider::new(
        ScriptedSource::new(&[Step::Fail]),
        settings(Duration::from_secs(3600), Duration::from_secs(60)),
    );
    assert_close(provider.get_rate().await, 54.50);
}

#[tokio::test]
async fn failure_after_success_reuses_last_known_good() {
    let provider = RateProvider::new(
        ScriptedSource::new(&[Step::Rate(40.0), Step::Fail]),
        settings(Duration::ZERO, Duration::from_secs(60)),
    );

    let live = provider.quote().await;
    let degraded = provider.quote().await;

    assert_eq!(live.origin, RateOrigin::Live);
    assert_eq!(degraded.origin, RateOrigin::LastKnownGood);
    assert_close(degraded.rate, 40.0);
    assert_eq!(degraded.as_of, live.as_of);
    assert_eq!(provider.source.calls(), 2);
}

#[tokio::test]
async fn substituted_rate_is_reused_for_failure_ttl() {
    let provider = RateProvider::new(
        ScriptedSource::new(&[Step::Fail]),
        settings(Duration::from_secs(3600), Duration::from_secs(60)),
    );

    provider.get_rate().await;
    let second = provider.quote().await;

    assert_eq!(second.origin, RateOrigin::Fallback);
    assert_eq!(provider.source.calls(), 1);
}

#[tokio::test]
async fn recovers_once_failure_ttl_expires() {
    let provider = RateProvider::new(
        ScriptedSource::new(&[Step::Fail, Step::Rate(41.25)]),
        settings(Duration::from_secs(3600), Duration::ZERO),
    );

    assert_eq!(provider.quote().await.origin, RateOrigin::Fallback);
    let recovered = provider.quote().await;
    assert_eq!(recovered.origin, RateOrigin::Live);
    assert_close(recovered.rate, 41.25);
}

#[tokio::test]
async fn non_positive_rate_is_treated_as_failure() {
    for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let provider = RateProvider::new(
            ScriptedSource::new(&[Step::Rate(bad)]),
            settings(Duration::from_secs(3600), Duration::from_secs(60)),
        );
        let quote = provider.quote().await;
        assert_eq!(quote.origin, RateOrigin::Fallback, "rate {bad}");
        assert_close(quote.rate, 54.50);
    }
}

#[tokio::test]
async fn invalidate_forces_refetch() {
    let provider = RateProvider::new(
        ScriptedSource::new(&[Step::Rate(36.5), Step::Rate(37.0)]),
        settings(Duration::from_secs(3600), Duration::from_secs(60)),
    );

    assert_close(provider.get_rate().await, 36.5);
    provider.invalidate().await;
    assert_close(provider.get_rate().await, 37.0);
    assert_eq!(provider.source.calls(), 2);
}

#[tokio::test]
async fn concurrent_callers_share_one_fetch() {
    let provider = RateProvider::new(
        ScriptedSource::new(&[Step::Slow(36.5)]),
        RateSettings {
            timeout: Duration::from_secs(5),
            ..settings(Duration::from_secs(3600), Duration::from_secs(60))
        },
    );

    let (a, b, c, d) = tokio::join!(
        provider.quote(),
        provider.quote(),
        provider.quote(),
        provider.quote()
    );

    assert_eq!(provider.source.calls(), 1);
    for quote in [a, b, c, d] {
        assert_close(quote.rate, 36.5);
    }
    let live = [a, b, c, d]
        .iter()
        .filter(|q| q.origin == RateOrigin::Live)
        .count();
    assert_eq!(live, 1, "only the caller that fetched sees a live quote");
}
