//! Expiring memoizer: serves the last fetched content for a key until its
//! TTL runs out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, instrument, warn};

use pagecache_core::constants::DEFAULT_TTL_SECONDS;
use pagecache_core::error::Result;
use pagecache_core::traits::{Clock, Fetcher};
use pagecache_core::types::{CacheEntry, CacheStats};

use crate::clock::SystemClock;

/// Memoizer configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long fetched content is served, in seconds.
    ///
    /// Zero disables memoization: every call fetches.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl CacheConfig {
    /// Creates a config with the given TTL in seconds.
    pub fn with_ttl_seconds(ttl_seconds: u64) -> Self {
        Self { ttl_seconds }
    }

    /// TTL as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Wraps a [`Fetcher`] and memoizes its results per key for a fixed TTL.
///
/// An entry is fresh while `now - fetched_at < ttl`; at exactly the TTL it is
/// expired and the next call fetches again. Failed fetches propagate as-is
/// and leave the table untouched, so a stale entry is never served.
///
/// # Thread Safety
///
/// Safe to share between tasks. At most one fetch per key is in flight:
/// callers that find the same key missing or expired queue behind the first
/// one and are answered from the entry it stores. A failed fetch stores
/// nothing, so each queued caller then makes its own attempt in turn.
pub struct ExpiringMemoizer<F> {
    inner: F,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Per-key fetch slots
    in_flight: DashMap<String, Arc<AsyncMutex<()>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
}

impl<F: Fetcher> ExpiringMemoizer<F> {
    /// Creates a memoizer over `inner` using the system clock.
    pub fn new(inner: F, config: CacheConfig) -> Self {
        Self::with_clock(inner, config, Arc::new(SystemClock))
    }

    /// Creates a memoizer with an injected clock.
    pub fn with_clock(inner: F, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            ttl: config.ttl(),
            clock,
            entries: RwLock::new(HashMap::new()),
            in_flight: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    /// Returns the content for `key`, fetching it if there is no fresh entry.
    #[instrument(skip(self))]
    pub async fn fetch(&self, key: &str) -> Result<String> {
        if let Some(content) = self.fresh_content(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache hit");
            return Ok(content);
        }

        let slot = self
            .in_flight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .value()
            .clone();
        let guard = slot.lock().await;
        let result = self.fetch_locked(key).await;

        // Drop the slot unless another caller is queued on it.
        self.in_flight
            .remove_if(key, |_, s| Arc::ptr_eq(s, &slot) && Arc::strong_count(s) == 2);
        drop(guard);

        result
    }

    /// Runs with the key's slot held.
    async fn fetch_locked(&self, key: &str) -> Result<String> {
        // Whoever held the slot before us may have just stored the entry.
        if let Some(content) = self.fresh_content(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache hit after waiting for in-flight fetch");
            return Ok(content);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, "Cache miss, fetching");

        let content = match self.inner.fetch(key).await {
            Ok(content) => content,
            Err(e) => {
                warn!(key, error = %e, "Fetch failed");
                return Err(e);
            }
        };

        let fetched_at = self.clock.now();
        self.entries.write().insert(
            key.to_string(),
            CacheEntry::new(key, content.clone(), fetched_at),
        );
        self.fetches.fetch_add(1, Ordering::Relaxed);
        debug!(key, bytes = content.len(), "Stored fresh entry");

        Ok(content)
    }

    /// Returns the wrapped fetcher.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F> ExpiringMemoizer<F> {
    fn fresh_content(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        self.entries
            .read()
            .get(key)
            .filter(|e| e.is_fresh(now, self.ttl))
            .map(|e| e.content.clone())
    }

    /// Returns the entry for `key` if it is still fresh, without fetching.
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        self.entries
            .read()
            .get(key)
            .filter(|e| e.is_fresh(now, self.ttl))
            .cloned()
    }

    /// Drops the entry for `key`; the next call fetches.
    ///
    /// A fetch already in flight for `key` still completes and stores its
    /// result; callers queued behind it are answered from that result.
    pub fn invalidate(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Drops every entry. In-flight fetches are left to finish.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Removes expired entries and idle fetch slots; returns how many
    /// entries were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let dropped = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, e| e.is_fresh(now, self.ttl));
            before - entries.len()
        };
        // A slot only referenced by the map has nobody fetching or waiting.
        self.in_flight.retain(|_, slot| Arc::strong_count(slot) > 1);
        dropped
    }

    /// Returns the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.read();
        let fresh = entries.values().filter(|e| e.is_fresh(now, self.ttl)).count();

        CacheStats {
            total_entries: entries.len(),
            fresh_entries: fresh,
            expired_entries: entries.len() - fresh,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for ExpiringMemoizer<F> {
    async fn fetch(&self, key: &str) -> Result<String> {
        ExpiringMemoizer::fetch(self, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::StubFetcher;
    use test_case::test_case;

    const URL: &str = "http://slowwly.robertomurray.co.uk/delay/1000/url/https://www.example.com";

    fn setup() -> (ExpiringMemoizer<Arc<StubFetcher>>, Arc<StubFetcher>, Arc<ManualClock>) {
        let stub = Arc::new(StubFetcher::new());
        let clock = Arc::new(ManualClock::new());
        let memo = ExpiringMemoizer::with_clock(stub.clone(), CacheConfig::default(), clock.clone());
        (memo, stub, clock)
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_is_a_hit() {
        let (memo, stub, clock) = setup();

        let first = memo.fetch(URL).await.unwrap();
        clock.advance(Duration::from_secs(3));
        let second = memo.fetch(URL).await.unwrap();

        assert_eq!(stub.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(first, format!("{}#1", URL));
    }

    #[tokio::test]
    async fn test_refetch_after_ttl() {
        let (memo, stub, clock) = setup();

        memo.fetch(URL).await.unwrap();
        let first_fetched_at = memo.peek(URL).unwrap().fetched_at;

        clock.advance(Duration::from_secs(11));
        let content = memo.fetch(URL).await.unwrap();

        assert_eq!(stub.calls(), 2);
        assert_eq!(content, format!("{}#2", URL));
        let entry = memo.peek(URL).unwrap();
        assert!(entry.fetched_at > first_fetched_at);
        assert_eq!(entry.fetched_at, clock.now());
    }

    #[test_case(9_999, 1 ; "just before ttl is fresh")]
    #[test_case(10_000, 2 ; "exactly at ttl is expired")]
    #[test_case(10_001, 2 ; "after ttl is expired")]
    #[tokio::test]
    async fn test_ttl_boundary(elapsed_ms: u64, expected_fetches: usize) {
        let (memo, stub, clock) = setup();

        memo.fetch(URL).await.unwrap();
        clock.set_elapsed(Duration::from_millis(elapsed_ms));
        memo.fetch(URL).await.unwrap();

        assert_eq!(stub.calls(), expected_fetches);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (memo, stub, _clock) = setup();

        let a = memo.fetch("https://a.example").await.unwrap();
        let b = memo.fetch("https://b.example").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(stub.calls(), 2);

        assert_eq!(memo.fetch("https://a.example").await.unwrap(), a);
        assert_eq!(memo.fetch("https://b.example").await.unwrap(), b);
        assert_eq!(stub.calls(), 2);
        assert_eq!(memo.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_propagates_and_is_not_cached() {
        let (memo, stub, _clock) = setup();

        stub.set_failing(true);
        let err = memo.fetch(URL).await.unwrap_err();
        assert!(err.is_network_error());
        assert!(memo.is_empty());

        stub.set_failing(false);
        assert_eq!(memo.fetch(URL).await.unwrap(), format!("{}#2", URL));
    }

    #[tokio::test]
    async fn test_stale_entry_not_served_on_failure() {
        let (memo, stub, clock) = setup();

        memo.fetch(URL).await.unwrap();
        clock.advance(Duration::from_secs(10));
        stub.set_failing(true);

        assert!(memo.fetch(URL).await.is_err());
        assert!(memo.peek(URL).is_none());
        // The stale entry is still stored, just never returned.
        assert_eq!(memo.len(), 1);
        assert!(memo.fetch(URL).await.is_err());
    }

    #[tokio::test]
    async fn test_zero_ttl_always_fetches() {
        let stub = Arc::new(StubFetcher::new());
        let clock = Arc::new(ManualClock::new());
        let memo = ExpiringMemoizer::with_clock(
            stub.clone(),
            CacheConfig::with_ttl_seconds(0),
            clock,
        );

        memo.fetch(URL).await.unwrap();
        memo.fetch(URL).await.unwrap();
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let stub = Arc::new(StubFetcher::with_delay(Duration::from_millis(50)));
        let memo = ExpiringMemoizer::new(stub.clone(), CacheConfig::default());

        let results = futures::future::join_all((0..8).map(|_| memo.fetch(URL))).await;

        assert_eq!(stub.calls(), 1);
        for result in results {
            assert_eq!(result.unwrap(), format!("{}#1", URL));
        }
        let stats = memo.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 7);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fetch() {
        let (memo, stub, _clock) = setup();

        memo.fetch(URL).await.unwrap();
        memo.invalidate(URL);
        assert!(memo.peek(URL).is_none());

        memo.fetch(URL).await.unwrap();
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let (memo, _stub, _clock) = setup();

        memo.fetch("https://a.example").await.unwrap();
        memo.fetch("https://b.example").await.unwrap();
        memo.clear();
        assert!(memo.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let (memo, _stub, clock) = setup();

        memo.fetch("https://old.example").await.unwrap();
        clock.advance(Duration::from_secs(6));
        memo.fetch("https://new.example").await.unwrap();
        clock.advance(Duration::from_secs(5));

        assert_eq!(memo.cleanup_expired(), 1);
        assert_eq!(memo.len(), 1);
        assert!(memo.peek("https://new.example").is_some());
    }

    #[tokio::test]
    async fn test_fetch_slots_released() {
        let stub = Arc::new(StubFetcher::new());
        let memo = ExpiringMemoizer::new(stub.clone(), CacheConfig::with_ttl_seconds(0));

        for i in 0..100 {
            memo.fetch(&format!("https://example.com/{}", i)).await.unwrap();
        }
        assert!(memo.in_flight.is_empty());

        stub.set_failing(true);
        assert!(memo.fetch("https://example.com/down").await.is_err());
        assert!(memo.in_flight.is_empty());

        assert_eq!(memo.cleanup_expired(), 100);
        assert!(memo.is_empty());
        assert!(memo.in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_prunes_idle_slots() {
        let (memo, _stub, _clock) = setup();

        memo.in_flight
            .insert("https://abandoned.example".into(), Arc::new(AsyncMutex::new(())));
        let held = Arc::new(AsyncMutex::new(()));
        memo.in_flight.insert("https://busy.example".into(), held.clone());

        memo.cleanup_expired();
        assert_eq!(memo.in_flight.len(), 1);
        assert!(memo.in_flight.contains_key("https://busy.example"));
    }

    #[tokio::test]
    async fn test_invalidate_during_fetch_keeps_single_flight() {
        let stub = Arc::new(StubFetcher::with_delay(Duration::from_millis(100)));
        let memo = ExpiringMemoizer::new(stub.clone(), CacheConfig::default());

        let first = memo.fetch("k");
        let second = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            memo.invalidate("k");
            memo.fetch("k").await
        };
        let (a, b) = tokio::join!(first, second);

        assert_eq!(stub.calls(), 1);
        assert_eq!(a.unwrap(), "k#1");
        assert_eq!(b.unwrap(), "k#1");
    }

    #[tokio::test]
    async fn test_clear_during_fetch_keeps_single_flight() {
        let stub = Arc::new(StubFetcher::with_delay(Duration::from_millis(100)));
        let memo = ExpiringMemoizer::new(stub.clone(), CacheConfig::default());

        let first = memo.fetch("k");
        let second = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            memo.clear();
            memo.fetch("k").await
        };
        let (a, b) = tokio::join!(first, second);

        assert_eq!(stub.calls(), 1);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_waiters_retry_after_failed_fetch() {
        let stub = Arc::new(StubFetcher::with_delay(Duration::from_millis(20)));
        stub.set_failing(true);
        let memo = ExpiringMemoizer::new(stub.clone(), CacheConfig::default());

        let results = futures::future::join_all((0..3).map(|_| memo.fetch(URL))).await;

        // Failures are not shared: each queued caller makes its own attempt.
        assert!(results.iter().all(|r| r.is_err()));
        assert_eq!(stub.calls(), 3);
        assert_eq!(memo.stats().misses, 3);
        assert!(memo.is_empty());
        assert!(memo.in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let (memo, _stub, clock) = setup();

        memo.fetch("https://a.example").await.unwrap();
        memo.fetch("https://a.example").await.unwrap();
        clock.advance(Duration::from_secs(5));
        memo.fetch("https://b.example").await.unwrap();
        clock.advance(Duration::from_secs(5));

        let stats = memo.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.fresh_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.fetches, 2);
    }

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl_seconds, 10);
        assert_eq!(config.ttl(), Duration::from_secs(10));
    }
}
