//! Application constants for HITRAN XSC
//!
//! This module centralizes the constants used throughout the library,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Environment variable holding the HITRAN API key
    pub const API_KEY: &str = "HITRAN_API_KEY";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "HITRAN-XSC/0.1.0 (Spectroscopy Data Browser)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 4;
}

/// HITRAN API endpoints
pub mod hitran {
    /// HITRAN web service base URL
    pub const BASE_URL: &str = "https://hitran.org";

    /// API version segment
    pub const API_VERSION: &str = "v2";

    /// Cross-section metadata endpoint, relative to `/api/{version}/{key}/`
    pub const XSC_META_ENDPOINT: &str = "cross-sections/";

    /// Stands in for the API key wherever a URL is logged
    pub const REDACTED_KEY: &str = "***";
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for HITRAN API requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 2;

    /// Maximum retry attempts for failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;
}

/// Cache-related constants
pub mod cache {
    use super::Duration;

    /// Application directory name under the OS cache/config dirs
    pub const APP_DIR_NAME: &str = "hitran-xsc";

    /// Sub-directory holding cross-section caches
    pub const XSC_DIR_NAME: &str = "xsc";

    /// Field holding the write time in every cache file
    pub const TIMESTAMP_FIELD: &str = "timestamp";

    /// File extension of cross-section metadata caches
    pub const XSCM_EXTENSION: &str = ".xscm";

    /// Payload field of cross-section metadata caches
    pub const XSCM_PAYLOAD_FIELD: &str = "metas";

    /// Logical name of the cross-section metadata cache
    pub const XSCM_NAME: &str = "cross_sections";

    /// Default maximum age before cached metadata is re-fetched
    pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

    /// Temporary file suffix for atomic writes
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";
}

// Re-export commonly used constants at module level for convenience
pub use cache::DEFAULT_MAX_AGE;
pub use env::API_KEY as ENV_API_KEY;
pub use http::USER_AGENT;
pub use limits::DEFAULT_RATE_LIMIT_RPS;
