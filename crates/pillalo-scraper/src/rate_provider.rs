//! Cached, fail-soft access to the exchange rate.
//!
//! [`RateProvider::get_rate`] never fails. A fetch that errors, times out or
//! yields a non-positive value is logged and replaced by the last-known-good
//! rate, or by the configured fallback when no fetch has ever succeeded.
//! Good rates are reused for `ttl`; substituted rates only for
//! `failure_ttl`, so a dead upstream is retried soon without stalling every
//! caller on the timeout.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::ScraperError;
use crate::rate::RateSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOrigin {
    /// Fetched by this call.
    Live,
    /// A live value fetched earlier and still within its TTL.
    Cached,
    /// The upstream failed; the most recent good value was reused.
    LastKnownGood,
    /// The upstream failed and no good value was ever seen.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateQuote {
    pub rate: f64,
    pub origin: RateOrigin,
    /// When `rate` was obtained from upstream (or substituted).
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct RateSettings {
    pub ttl: Duration,
    pub failure_ttl: Duration,
    /// Hard bound on one upstream fetch.
    pub timeout: Duration,
    pub fallback: f64,
}

impl RateSettings {
    #[must_use]
    pub fn from_app_config(config: &pillalo_core::AppConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.rate_ttl_secs),
            failure_ttl: Duration::from_secs(config.rate_failure_ttl_secs),
            timeout: Duration::from_secs(config.rate_timeout_secs),
            fallback: config.rate_fallback,
        }
    }
}

#[derive(Debug, Default)]
struct RateState {
    current: Option<(RateQuote, Instant)>,
    last_good: Option<RateQuote>,
}

pub struct RateProvider<S> {
    source: S,
    settings: RateSettings,
    state: Mutex<RateState>,
}

impl<S: RateSource> RateProvider<S> {
    #[must_use]
    pub fn new(source: S, settings: RateSettings) -> Self {
        Self {
            source,
            settings,
            state: Mutex::new(RateState::default()),
        }
    }

    /// Returns the current rate. See [`Self::quote`].
    pub async fn get_rate(&self) -> f64 {
        self.quote().await.rate
    }

    /// Returns the current rate together with where it came from.
    ///
    /// Concurrent callers share one in-flight refresh: the state lock is held
    /// across the fetch, which is itself bounded by `settings.timeout`.
    pub async fn quote(&self) -> RateQuote {
        let mut state = self.state.lock().await;

        if let Some((quote, expires_at)) = state.current {
            if Instant::now() < expires_at {
                let origin = match quote.origin {
                    RateOrigin::Live => RateOrigin::Cached,
                    other => other,
                };
                return RateQuote { origin, ..quote };
            }
        }

        let now = Instant::now();
        match self.fetch_bounded().await {
            Ok(rate) => {
                tracing::info!(source = self.source.name(), rate, "exchange rate refreshed");
                let quote = RateQuote {
                    rate,
                    origin: RateOrigin::Live,
                    as_of: Utc::now(),
                };
                state.last_good = Some(quote);
                state.current = Some((quote, now + self.settings.ttl));
                quote
            }
            Err(error) => {
                let quote = match state.last_good {
                    Some(good) => RateQuote {
                        origin: RateOrigin::LastKnownGood,
                        ..good
                    },
                    None => RateQuote {
                        rate: self.settings.fallback,
                        origin: RateOrigin::Fallback,
                        as_of: Utc::now(),
                    },
                };
                tracing::warn!(
                    source = self.source.name(),
                    %error,
                    rate = quote.rate,
                    origin = ?quote.origin,
                    "exchange rate unavailable, using substitute"
                );
                state.current = Some((quote, now + self.settings.failure_ttl));
                quote
            }
        }
    }

    /// Drops the cached value so the next call refetches. The last-known-good
    /// rate is kept.
    pub async fn invalidate(&self) {
        self.state.lock().await.current = None;
    }

    async fn fetch_bounded(&self) -> Result<f64, ScraperError> {
        let timeout = self.settings.timeout;
        let rate = tokio::time::timeout(timeout, self.source.fetch_rate())
            .await
            .map_err(|_| ScraperError::Timeout {
                source_name: self.source.name().to_owned(),
                timeout_ms: timeout.as_millis(),
            })??;

        if rate.is_finite() && rate > 0.0 {
            Ok(rate)
        } else {
            Err(ScraperError::InvalidRate {
                raw: rate.to_string(),
                reason: "rate must be positive and finite".to_owned(),
            })
        }
    }
}

#[cfg(test)]
#[path = "rate_provider_test.rs"]
mod tests;
