//! Domain types for the page cache.
//!
//! - [`CacheEntry`]: last fetched content for a key and when it was fetched
//! - [`AccessCount`]: how many times a key was requested
//! - [`CacheStats`]: point-in-time view of a memoizer

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Content stored for one key.
///
/// There is at most one entry per key; a refresh overwrites it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// Key the content was fetched for (the URL)
    pub key: String,
    /// Fetched body
    pub content: String,
    /// When the fetch completed
    pub fetched_at: Instant,
}

impl CacheEntry {
    /// Creates an entry for `key`.
    pub fn new(key: impl Into<String>, content: impl Into<String>, fetched_at: Instant) -> Self {
        Self {
            key: key.into(),
            content: content.into(),
            fetched_at,
        }
    }

    /// Time elapsed between the fetch and `now`.
    ///
    /// Saturates to zero if `now` is earlier than the fetch.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// Returns true while `age < ttl`.
    ///
    /// An entry whose age equals the TTL is already expired.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Number of requests seen for a key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCount {
    /// Key the requests were made for
    pub key: String,
    /// Requests so far, hits and misses alike
    pub count: u64,
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries stored, fresh or not
    pub total_entries: usize,
    /// Entries that would be served without fetching
    pub fresh_entries: usize,
    /// Entries past their TTL
    pub expired_entries: usize,
    /// Calls answered from cache
    pub hits: u64,
    /// Calls that went to the fetcher
    pub misses: u64,
    /// Fetches that completed successfully
    pub fetches: u64,
}

impl CacheStats {
    /// Fraction of calls answered from cache, 0.0 when nothing was asked yet.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
