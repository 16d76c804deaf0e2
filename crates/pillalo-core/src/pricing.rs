//! Price normalization and USD → VES conversion.
//!
//! Sheet prices are free text typed by sellers (`"1,05"`, `"$2.50"`, `" 3 "`).
//! [`parse_price`] is the strict parser and reports why a value was rejected;
//! [`normalize_price`] is the fail-soft boundary used while rendering the
//! catalog, which substitutes `0.0` and logs the rejection.

use serde::Serialize;
use thiserror::Error;

/// Reasons a raw price cell could not be turned into a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price is empty")]
    Empty,

    #[error("price \"{raw}\" contains no digits")]
    NoDigits { raw: String },

    /// Both `,` and `.` appear, e.g. `"1,234.56"`. The thousands separator
    /// cannot be told apart from the decimal one, so the value is rejected
    /// instead of guessed.
    #[error("price \"{raw}\" mixes ',' and '.' separators")]
    AmbiguousSeparators { raw: String },

    #[error("price \"{raw}\" is not a number")]
    Unparseable { raw: String },

    #[error("price \"{raw}\" is out of range")]
    OutOfRange { raw: String },
}

/// Parses a raw price cell into a non-negative finite USD amount.
///
/// Every character other than ASCII digits, `.` and `,` is dropped, then a
/// comma decimal separator is rewritten to a dot (`"1,05"` → `1.05`).
///
/// # Errors
///
/// Returns a [`PriceError`] describing why the text is not a usable price.
pub fn parse_price(raw: &str) -> Result<f64, PriceError> {
    if raw.trim().is_empty() {
        return Err(PriceError::Empty);
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    if !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return Err(PriceError::NoDigits {
            raw: raw.to_owned(),
        });
    }

    if cleaned.contains(',') && cleaned.contains('.') {
        return Err(PriceError::AmbiguousSeparators {
            raw: raw.to_owned(),
        });
    }

    let value = cleaned
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| PriceError::Unparseable {
            raw: raw.to_owned(),
        })?;

    if !value.is_finite() {
        return Err(PriceError::OutOfRange {
            raw: raw.to_owned(),
        });
    }

    Ok(value)
}

/// Fail-soft wrapper around [`parse_price`]: malformed input becomes `0.0`.
///
/// Empty cells are logged at `debug`; anything else that fails to parse is
/// logged at `warn` so data-quality problems in the sheet stay visible.
#[must_use]
pub fn normalize_price(raw: &str) -> f64 {
    match parse_price(raw) {
        Ok(value) => value,
        Err(PriceError::Empty) => {
            tracing::debug!("empty price cell, using 0");
            0.0
        }
        Err(error) => {
            tracing::warn!(raw, %error, "malformed price, using 0");
            0.0
        }
    }
}

/// Converts a USD amount to local currency at `rate`.
///
/// The product of two finite inputs is returned as-is. A non-finite result
/// (overflow, or a NaN/infinite input) is clamped to `0.0`.
#[must_use]
pub fn to_local(usd: f64, rate: f64) -> f64 {
    let local = usd * rate;
    if local.is_finite() {
        local
    } else {
        tracing::warn!(usd, rate, "non-finite local price, using 0");
        0.0
    }
}

/// Formats an amount with two decimals, e.g. `52.5` → `"52.50"`.
#[must_use]
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

/// Formats a bolívar amount the way it is written locally:
/// dot thousands separator, comma decimals, `Bs.` prefix.
///
/// `1234.5` → `"Bs. 1.234,50"`.
#[must_use]
pub fn format_bolivares(value: f64) -> String {
    let fixed = format_amount(value.max(0.0));
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("Bs. {grouped},{frac_part}")
}

/// A price ready for display: the normalized USD value, its local
/// equivalent and the rate used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceQuote {
    pub usd: f64,
    pub local: f64,
    pub rate: f64,
}

impl PriceQuote {
    #[must_use]
    pub fn new(usd: f64, rate: f64) -> Self {
        Self {
            usd,
            local: to_local(usd, rate),
            rate,
        }
    }

    /// Normalizes `raw` and converts it at `rate`.
    #[must_use]
    pub fn from_raw(raw: &str, rate: f64) -> Self {
        Self::new(normalize_price(raw), rate)
    }
}

#[cfg(test)]
#[path = "pricing_test.rs"]
mod tests;
