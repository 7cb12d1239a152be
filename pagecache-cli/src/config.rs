//! Runtime configuration: defaults, overridden by `.env` and the process
//! environment.

use pagecache_cache::CacheConfig;
use pagecache_core::constants::{
    ENV_ERROR_FOR_STATUS, ENV_TIMEOUT_SECONDS, ENV_TTL_SECONDS, ENV_USER_AGENT,
};
use pagecache_core::error::{PageCacheError, Result};
use pagecache_http::HttpConfig;

/// Settings for the page cache and its HTTP fetcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TTL for cached pages
    pub cache: CacheConfig,
    /// HTTP client settings
    pub http: HttpConfig,
}

impl AppConfig {
    /// Loads `.env` if present, then reads the `PAGECACHE_*` variables.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; unset variables keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TTL_SECONDS) {
            config.cache.ttl_seconds = parse_seconds(ENV_TTL_SECONDS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECONDS) {
            config.http.timeout_seconds = parse_seconds(ENV_TIMEOUT_SECONDS, &raw)?;
        }
        if let Some(agent) = lookup(ENV_USER_AGENT) {
            config.http.user_agent = agent;
        }
        if let Some(raw) = lookup(ENV_ERROR_FOR_STATUS) {
            config.http.error_for_status = raw != "false" && raw != "0";
        }

        Ok(config)
    }
}

fn parse_seconds(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| {
        PageCacheError::ConfigError(format!("{} must be a whole number of seconds, got '{}'", name, raw))
    })
}
