//! Expiring memoizer and access counter for pagecache.
//!
//! The layers compose by wrapping, outermost first:
//!
//! ```text
//! CountingFetcher ─▶ ExpiringMemoizer ─▶ leaf Fetcher (HTTP)
//! ```
//!
//! Every call is counted; the memoizer decides whether the leaf is called.
//! [`PageCache`] assembles the stack.

mod clock;
mod counter;
mod memoizer;
mod pipeline;

#[cfg(test)]
mod testing;

pub use clock::{ManualClock, SystemClock};
pub use counter::{AccessCounter, CountingFetcher};
pub use memoizer::{CacheConfig, ExpiringMemoizer};
pub use pipeline::PageCache;
