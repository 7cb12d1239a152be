//! HTTP fetcher implementation.
//!
//! Issues a plain GET and returns the body text. No retries, no URL
//! validation: whatever `reqwest` rejects comes back as an `HttpError`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use pagecache_core::constants::{DEFAULT_TIMEOUT_SECONDS, DEFAULT_USER_AGENT};
use pagecache_core::error::{PageCacheError, Result};
use pagecache_core::traits::Fetcher;

/// HTTP fetcher configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Treat non-2xx responses as errors instead of returning their body
    pub error_for_status: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            error_for_status: false,
        }
    }
}

impl HttpConfig {
    /// Sets the request timeout.
    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Fails on non-2xx responses.
    pub fn error_for_status(mut self) -> Self {
        self.error_for_status = true;
        self
    }
}

/// Fetches page bodies over HTTP.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    config: HttpConfig,
    http_client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpConfig::default())
    }

    /// Creates a fetcher with the given config.
    pub fn with_config(config: HttpConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PageCacheError::ClientBuildError(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// GETs `url` and returns the response body as text.
    #[instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| PageCacheError::HttpError(e.to_string()))?;

        let status = response.status();
        if self.config.error_for_status && !status.is_success() {
            return Err(PageCacheError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PageCacheError::HttpError(e.to_string()))?;

        debug!(url, status = status.as_u16(), bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, key: &str) -> Result<String> {
        self.get_text(key).await
    }
}
