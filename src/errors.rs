//! Error types for HITRAN XSC
//!
//! This module defines the error types for all components of the library.
//! Data-availability failures (missing cache entries, failed fetches) are
//! recoverable and normally absorbed by [`crate::app::cache::JsonCache`];
//! only [`CacheError::NotLoaded`] signals a caller contract violation.

use std::path::PathBuf;
use thiserror::Error;

/// Disk cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// No usable entry stored under the key (absent or malformed)
    #[error("Cache entry not found: {key}")]
    NotFound { key: String },

    /// Data requested from a cache whose load did not succeed
    #[error("Cache data for {key} requested before a successful load. Check ok() first")]
    NotLoaded { key: String },

    /// Cache directory not found or inaccessible
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// Atomic file operation failed
    #[error("Atomic cache write failed: could not rename {temp_path} to {final_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// I/O error during cache file operations
    #[error("Cache I/O error")]
    Io(#[from] std::io::Error),

    /// Payload could not be serialized
    #[error("Cache serialization error")]
    Serialization(#[from] serde_json::Error),
}

/// Remote fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Server returned error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Server overloaded
    #[error("Server overloaded. Server responded with HTTP 503")]
    ServerOverloaded,

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded for request")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// No API key configured
    #[error("Missing HITRAN API key. Set HITRAN_API_KEY or client.api_key in the config file")]
    MissingApiKey,

    /// Response body was not valid JSON
    #[error("Response body is not valid JSON")]
    InvalidJson(#[from] serde_json::Error),

    /// Generic error for other issues
    #[error("{0}")]
    Other(String),
}

/// Metadata validation errors
#[derive(Error, Debug)]
pub enum MetadataError {
    /// A cross-section record is missing fields or has the wrong shape
    #[error("Malformed cross-section record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Metadata error
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient or fixable by a re-fetch)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Cache(CacheError::NotFound { .. })
            | AppError::Fetch(FetchError::Http(_))
            | AppError::Fetch(FetchError::RateLimitExceeded)
            | AppError::Fetch(FetchError::ServerOverloaded)
            | AppError::Fetch(FetchError::MaxRetriesExceeded { .. })
            | AppError::Fetch(FetchError::ServerError { .. }) => true,

            AppError::Cache(CacheError::NotLoaded { .. })
            | AppError::Fetch(FetchError::MissingApiKey)
            | AppError::Config(_) => false,

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Cache(_) => "cache",
            AppError::Fetch(_) => "fetch",
            AppError::Metadata(_) => "metadata",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Result type for remote fetches
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type for metadata validation
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err = AppError::from(CacheError::NotFound {
            key: "cross_sections.xscm".to_string(),
        });
        assert_eq!(err.category(), "cache");
        assert!(err.is_recoverable());

        let err = AppError::from(FetchError::MissingApiKey);
        assert_eq!(err.category(), "fetch");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_not_loaded_is_not_recoverable() {
        let err = AppError::from(CacheError::NotLoaded {
            key: "cross_sections.xscm".to_string(),
        });
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("ok()"));
    }

    #[test]
    fn test_malformed_record_message() {
        let err = MetadataError::MalformedRecord {
            index: 3,
            reason: "missing field `filename`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed cross-section record at index 3: missing field `filename`"
        );
    }
}
