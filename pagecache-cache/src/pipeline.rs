//! Page cache: access counter over expiring memoizer over a leaf fetcher.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use pagecache_core::error::Result;
use pagecache_core::traits::{Clock, Fetcher};
use pagecache_core::types::{AccessCount, CacheStats};

use crate::counter::{AccessCounter, CountingFetcher};
use crate::memoizer::{CacheConfig, ExpiringMemoizer};

/// Fetches pages through a TTL cache while counting requests per URL.
///
/// # Example
///
/// ```rust,ignore
/// let cache = PageCache::new(HttpFetcher::new()?, CacheConfig::default());
/// let body = cache.get_page("https://example.com").await?;
/// assert_eq!(cache.access_count("https://example.com"), 1);
/// ```
pub struct PageCache<F> {
    stack: CountingFetcher<ExpiringMemoizer<F>>,
}

impl<F: Fetcher> PageCache<F> {
    /// Builds the stack over `fetcher` using the system clock.
    pub fn new(fetcher: F, config: CacheConfig) -> Self {
        Self {
            stack: CountingFetcher::new(ExpiringMemoizer::new(fetcher, config)),
        }
    }

    /// Builds the stack with an injected clock.
    pub fn with_clock(fetcher: F, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            stack: CountingFetcher::new(ExpiringMemoizer::with_clock(fetcher, config, clock)),
        }
    }

    /// Returns the page body for `url`.
    ///
    /// Always counted; fetched only when there is no fresh cached copy.
    #[instrument(skip(self))]
    pub async fn get_page(&self, url: &str) -> Result<String> {
        self.stack.fetch(url).await
    }
}

impl<F> PageCache<F> {
    /// Number of `get_page` calls made for `url`.
    pub fn access_count(&self, url: &str) -> u64 {
        self.stack.access_count(url)
    }

    /// Every URL's count, sorted by URL.
    pub fn access_counts(&self) -> Vec<AccessCount> {
        self.stack.counter().snapshot()
    }

    /// Memoizer statistics.
    pub fn stats(&self) -> CacheStats {
        self.stack.inner().stats()
    }

    /// Returns the memoizer layer.
    pub fn memoizer(&self) -> &ExpiringMemoizer<F> {
        self.stack.inner()
    }

    /// Returns the access counter.
    pub fn counter(&self) -> &AccessCounter {
        self.stack.counter()
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for PageCache<F> {
    async fn fetch(&self, key: &str) -> Result<String> {
        self.get_page(key).await
    }
}
