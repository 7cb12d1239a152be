//! Error types for pagecache.
//!
//! The cache layers never translate errors: whatever the fetcher returns is
//! what the caller sees.

use thiserror::Error;

/// Result type alias using `PageCacheError`.
pub type Result<T> = std::result::Result<T, PageCacheError>;

/// Main error type for all pagecache operations.
#[derive(Debug, Error)]
pub enum PageCacheError {
    // ═══════════════════════════════════════════════════════════════════════════
    // NETWORK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// HTTP request failed before a response was read.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Server answered with a non-success status (only when configured to
    /// treat those as errors).
    #[error("HTTP {status} from '{url}'")]
    HttpStatus { url: String, status: u16 },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuildError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PageCacheError {
    /// Returns true if this error came from the network.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            PageCacheError::HttpError(_) | PageCacheError::HttpStatus { .. }
        )
    }
}
