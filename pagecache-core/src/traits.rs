//! Common traits for pagecache.
//!
//! Every layer of the page cache (the HTTP fetcher, the expiring memoizer and
//! the access counter) implements [`Fetcher`], so layers compose by wrapping.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// FETCHER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Produces content for a key.
///
/// Implementations might:
/// - Issue an HTTP GET for the key (the leaf fetcher)
/// - Serve a memoized copy and only delegate when it expired
/// - Record the call and delegate unconditionally
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the content for `key`.
    ///
    /// The key is not validated; malformed input reaches the leaf fetcher
    /// unchanged and fails there if it is going to fail.
    async fn fetch(&self, key: &str) -> Result<String>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, key: &str) -> Result<String> {
        (**self).fetch(key).await
    }
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Box<T> {
    async fn fetch(&self, key: &str) -> Result<String> {
        (**self).fetch(key).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Source of the current time for freshness checks.
///
/// Injected so tests can move time without sleeping.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Fetcher for Echo {
        async fn fetch(&self, key: &str) -> Result<String> {
            Ok(key.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_fetcher_through_smart_pointers() {
        let shared: Arc<dyn Fetcher> = Arc::new(Echo);
        assert_eq!(shared.fetch("abc").await.unwrap(), "ABC");

        let boxed: Box<dyn Fetcher> = Box::new(Echo);
        assert_eq!(boxed.fetch("xyz").await.unwrap(), "XYZ");
    }
}
