//! # pagecache core
//!
//! Core types, errors, and traits shared by the pagecache crates.
//!
//! - **Types**: cache entries, access counts and cache statistics
//! - **Errors**: a single error enum for every fetch and config failure
//! - **Constants**: default TTL and client settings
//! - **Traits**: the [`Fetcher`] seam every layer implements, and the
//!   injectable [`Clock`]
//!
//! ## Example
//!
//! ```rust
//! use pagecache_core::{CacheEntry, DEFAULT_TTL_SECONDS};
//! use std::time::{Duration, Instant};
//!
//! let fetched_at = Instant::now();
//! let entry = CacheEntry::new("https://example.com", "<html></html>", fetched_at);
//! let ttl = Duration::from_secs(DEFAULT_TTL_SECONDS);
//! assert!(entry.is_fresh(fetched_at, ttl));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{PageCacheError, Result};
pub use traits::*;
pub use types::*;
