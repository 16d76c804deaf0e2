//! Upstream exchange-rate sources.
//!
//! The official USD → VES rate is published on the BCV homepage inside
//! `<div id="dolar"> … <strong> 36,50370000 </strong>`. The page layout is
//! not stable, so extraction lives behind [`RateSource`] and any failure is
//! absorbed by [`crate::RateProvider`].

use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;

use crate::client::fetch_text;
use crate::error::ScraperError;

static BCV_DOLAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)id\s*=\s*["']dolar["'].*?<strong[^>]*>\s*([^<]*?)\s*</strong>"#)
        .expect("valid regex")
});

/// Something that can produce one fresh USD → local rate.
pub trait RateSource: Send + Sync {
    /// Short name used in logs and timeout errors.
    fn name(&self) -> &str;

    /// Performs a single fetch. No retries, no caching.
    fn fetch_rate(&self) -> impl Future<Output = Result<f64, ScraperError>> + Send;
}

/// Reads the official rate from the BCV homepage.
pub struct BcvRateSource {
    client: Client,
    url: String,
}

impl BcvRateSource {
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl RateSource for BcvRateSource {
    fn name(&self) -> &str {
        "bcv"
    }

    async fn fetch_rate(&self) -> Result<f64, ScraperError> {
        let body = fetch_text(&self.client, &self.url).await?;
        extract_bcv_rate(&body, &self.url)
    }
}

/// BCV writes comma decimals. When a comma is present any dot is a
/// thousands separator (`1.234,56`) and is dropped before parsing.
fn parse_bcv_number(raw: &str) -> Result<f64, pillalo_core::PriceError> {
    if raw.contains(',') {
        pillalo_core::parse_price(&raw.replace('.', ""))
    } else {
        pillalo_core::parse_price(raw)
    }
}

/// Pulls the dollar rate out of a BCV homepage body.
///
/// # Errors
///
/// - [`ScraperError::RateNotFound`]: no `id="dolar"` block with a `<strong>` value.
/// - [`ScraperError::InvalidRate`]: the value is not a positive number.
pub fn extract_bcv_rate(html: &str, url: &str) -> Result<f64, ScraperError> {
    let raw = BCV_DOLAR_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .ok_or_else(|| ScraperError::RateNotFound {
            url: url.to_owned(),
        })?;

    let rate = parse_bcv_number(raw).map_err(|e| ScraperError::InvalidRate {
        raw: raw.to_owned(),
        reason: e.to_string(),
    })?;

    if rate <= 0.0 {
        return Err(ScraperError::InvalidRate {
            raw: raw.to_owned(),
            reason: "rate must be positive".to_owned(),
        });
    }

    Ok(rate)
}
