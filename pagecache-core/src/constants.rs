//! Defaults for the page cache and its HTTP fetcher.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// How long a fetched page is served from cache, in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 10;

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP CLIENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Request timeout for the HTTP fetcher, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("pagecache/", env!("CARGO_PKG_VERSION"));

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Overrides [`DEFAULT_TTL_SECONDS`].
pub const ENV_TTL_SECONDS: &str = "PAGECACHE_TTL_SECONDS";

/// Overrides [`DEFAULT_TIMEOUT_SECONDS`].
pub const ENV_TIMEOUT_SECONDS: &str = "PAGECACHE_TIMEOUT_SECONDS";

/// Overrides [`DEFAULT_USER_AGENT`].
pub const ENV_USER_AGENT: &str = "PAGECACHE_USER_AGENT";

/// When true, non-2xx responses are errors instead of bodies.
pub const ENV_ERROR_FOR_STATUS: &str = "PAGECACHE_ERROR_FOR_STATUS";
