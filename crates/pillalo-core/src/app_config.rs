use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// CSV export URL of the catalog sheet.
    pub sheet_url: String,
    pub sheet_cache_ttl_secs: u64,
    pub rate_source_url: String,
    /// Rate served when the upstream source cannot be read and no
    /// last-known-good value exists.
    pub rate_fallback: f64,
    pub rate_ttl_secs: u64,
    pub rate_failure_ttl_secs: u64,
    pub rate_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub admin_keys: Vec<String>,
}

impl AppConfig {
    /// Returns `true` when running in the development environment.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("sheet_url", &self.sheet_url)
            .field("sheet_cache_ttl_secs", &self.sheet_cache_ttl_secs)
            .field("rate_source_url", &self.rate_source_url)
            .field("rate_fallback", &self.rate_fallback)
            .field("rate_ttl_secs", &self.rate_ttl_secs)
            .field("rate_failure_ttl_secs", &self.rate_failure_ttl_secs)
            .field("rate_timeout_secs", &self.rate_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field(
                "admin_keys",
                &format_args!("[{} redacted]", self.admin_keys.len()),
            )
            .finish()
    }
}
