//! HTTP fetcher for pagecache.
//!
//! A thin `reqwest` wrapper: one GET per call, body returned as text.

mod fetcher;

pub use fetcher::{HttpConfig, HttpFetcher};
