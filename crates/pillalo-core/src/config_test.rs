use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("PILLALO_SHEET_ID", "1hoSlaN-test-sheet");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "PILLALO_ENV"));
}

#[test]
fn build_app_config_fails_without_sheet_id() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PILLALO_SHEET_ID"),
        "expected MissingEnvVar(PILLALO_SHEET_ID), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_sheet_id_as_missing() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("PILLALO_SHEET_ID", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert!(cfg.is_development());
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(
        cfg.sheet_url,
        "https://docs.google.com/spreadsheets/d/1hoSlaN-test-sheet/export?format=csv"
    );
    assert_eq!(cfg.sheet_cache_ttl_secs, 60);
    assert_eq!(cfg.rate_source_url, "https://www.bcv.org.ve/");
    assert!((cfg.rate_fallback - 54.50).abs() < f64::EPSILON);
    assert_eq!(cfg.rate_ttl_secs, 3600);
    assert_eq!(cfg.rate_failure_ttl_secs, 60);
    assert_eq!(cfg.rate_timeout_secs, 10);
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "pillalo/0.1 (catalog)");
    assert!(cfg.admin_keys.is_empty());
}

#[test]
fn sheet_url_override_wins_over_sheet_id() {
    let mut map = full_env();
    map.insert("PILLALO_SHEET_URL", "http://127.0.0.1:9000/sheet.csv");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.sheet_url, "http://127.0.0.1:9000/sheet.csv");
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = full_env();
    map.insert("PILLALO_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PILLALO_BIND_ADDR"),
        "expected InvalidEnvVar(PILLALO_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn rate_fallback_override() {
    let mut map = full_env();
    map.insert("PILLALO_RATE_FALLBACK", "36.25");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!((cfg.rate_fallback - 36.25).abs() < f64::EPSILON);
}

#[test]
fn rate_fallback_rejects_zero_and_negative() {
    for raw in ["0", "-3.5", "NaN", "inf"] {
        let mut map = full_env();
        map.insert("PILLALO_RATE_FALLBACK", raw);
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PILLALO_RATE_FALLBACK"),
            "expected InvalidEnvVar for {raw}, got: {result:?}"
        );
    }
}

#[test]
fn rate_ttl_invalid() {
    let mut map = full_env();
    map.insert("PILLALO_RATE_TTL_SECS", "an hour");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PILLALO_RATE_TTL_SECS")
    );
}

#[test]
fn rate_timeout_must_be_nonzero() {
    let mut map = full_env();
    map.insert("PILLALO_RATE_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PILLALO_RATE_TIMEOUT_SECS")
    );
}

#[test]
fn admin_keys_are_split_and_trimmed() {
    let mut map = full_env();
    map.insert("PILLALO_ADMIN_KEYS", " key-one , ,key-two");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.admin_keys, vec!["key-one", "key-two"]);
}

#[test]
fn debug_output_redacts_admin_keys() {
    let mut map = full_env();
    map.insert("PILLALO_ADMIN_KEYS", "super-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("[1 redacted]"));
}
