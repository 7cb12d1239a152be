//! Test doubles shared by the cache tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use pagecache_core::error::{PageCacheError, Result};
use pagecache_core::traits::Fetcher;

/// Fetcher that answers `"<key>#<n>"`, where `n` counts its own calls.
#[derive(Default)]
pub(crate) struct StubFetcher {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, key: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(PageCacheError::HttpError(format!("connection refused: {}", key)));
        }
        Ok(format!("{}#{}", key, n))
    }
}
