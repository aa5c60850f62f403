//! FX error types.

use thiserror::Error;

/// Errors that can occur while acquiring or applying exchange rates.
#[derive(Debug, Error)]
pub enum FxError {
    /// Rate provider could not be reached or answered with a transport error.
    #[error("Currency service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rate provider answered, but without usable rate data.
    #[error("Invalid response structure from currency API: {0}")]
    InvalidUpstreamResponse(String),

    /// Cache file could not be parsed. Recovered as an empty cache.
    #[error("Rate cache corrupt: {0}")]
    CacheCorrupt(String),

    /// Cache file could not be written.
    #[error("Rate cache persist failed: {0}")]
    CachePersist(String),

    /// Invalid FX configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
