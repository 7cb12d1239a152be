//! Per-key access counting.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use pagecache_core::error::Result;
use pagecache_core::traits::Fetcher;
use pagecache_core::types::AccessCount;

/// Shared table of request counts, one per key.
///
/// Counts start at zero and only go up until [`reset`](Self::reset) or
/// [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct AccessCounter {
    counts: DashMap<String, u64>,
}

impl AccessCounter {
    /// Creates an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one call for `key` and returns the updated count.
    ///
    /// The first call for a key returns 1.
    pub fn on_call(&self, key: &str) -> u64 {
        let mut count = self.counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Returns the count for `key`, 0 if it was never called.
    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).map(|c| *c).unwrap_or(0)
    }

    /// Returns every count, sorted by key.
    pub fn snapshot(&self) -> Vec<AccessCount> {
        let mut counts: Vec<AccessCount> = self
            .counts
            .iter()
            .map(|entry| AccessCount {
                key: entry.key().clone(),
                count: *entry.value(),
            })
            .collect();
        counts.sort_by(|a, b| a.key.cmp(&b.key));
        counts
    }

    /// Forgets the count for `key`.
    pub fn reset(&self, key: &str) {
        self.counts.remove(key);
    }

    /// Forgets every count.
    pub fn clear(&self) {
        self.counts.clear();
    }

    /// Returns the number of keys seen.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no key was seen.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Counts every call before handing it to the wrapped [`Fetcher`].
///
/// The count is taken first, so calls that end in an error are counted too.
pub struct CountingFetcher<F> {
    inner: F,
    counter: AccessCounter,
}

impl<F: Fetcher> CountingFetcher<F> {
    /// Wraps `inner` with a fresh counter.
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            counter: AccessCounter::new(),
        }
    }

    /// Records the call, then delegates.
    #[instrument(skip(self))]
    pub async fn fetch(&self, key: &str) -> Result<String> {
        let count = self.counter.on_call(key);
        debug!(key, count, "Access recorded");
        self.inner.fetch(key).await
    }
}

impl<F> CountingFetcher<F> {
    /// Number of calls seen for `key`.
    pub fn access_count(&self, key: &str) -> u64 {
        self.counter.count(key)
    }

    /// Returns the counter.
    pub fn counter(&self) -> &AccessCounter {
        &self.counter
    }

    /// Returns the wrapped fetcher.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for CountingFetcher<F> {
    async fn fetch(&self, key: &str) -> Result<String> {
        CountingFetcher::fetch(self, key).await
    }
}
