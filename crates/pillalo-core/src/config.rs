use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const SHEET_EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Builds the CSV export URL for a Google Sheet id.
#[must_use]
pub fn sheet_export_url(sheet_id: &str) -> String {
    format!("{SHEET_EXPORT_BASE}/{}/export?format=csv", sheet_id.trim())
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_rate = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(invalid(var, format!("rate must be positive, got {value}")))
        }
    };

    let sheet_id = require("PILLALO_SHEET_ID")?;
    let sheet_url = lookup("PILLALO_SHEET_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| sheet_export_url(&sheet_id));

    let env = parse_environment(&or_default("PILLALO_ENV", "development"))?;
    let bind_addr = parse_addr("PILLALO_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PILLALO_LOG_LEVEL", "info");

    let sheet_cache_ttl_secs = parse_u64("PILLALO_SHEET_CACHE_TTL_SECS", "60")?;

    let rate_source_url = or_default("PILLALO_RATE_SOURCE_URL", "https://www.bcv.org.ve/");
    let rate_fallback = parse_rate("PILLALO_RATE_FALLBACK", "54.50")?;
    let rate_ttl_secs = parse_u64("PILLALO_RATE_TTL_SECS", "3600")?;
    let rate_failure_ttl_secs = parse_u64("PILLALO_RATE_FAILURE_TTL_SECS", "60")?;
    let rate_timeout_secs = parse_u64("PILLALO_RATE_TIMEOUT_SECS", "10")?;
    if rate_timeout_secs == 0 {
        return Err(invalid(
            "PILLALO_RATE_TIMEOUT_SECS",
            "timeout must be at least 1 second".to_string(),
        ));
    }

    let request_timeout_secs = parse_u64("PILLALO_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PILLALO_USER_AGENT", "pillalo/0.1 (catalog)");

    let admin_keys = or_default("PILLALO_ADMIN_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        sheet_url,
        sheet_cache_ttl_secs,
        rate_source_url,
        rate_fallback,
        rate_ttl_secs,
        rate_failure_ttl_secs,
        rate_timeout_secs,
        request_timeout_secs,
        user_agent,
        admin_keys,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PILLALO_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
