//! Disk-backed JSON caching with expiration
//!
//! This module provides the two layers between the slow HITRAN API and the
//! in-memory metadata registry:
//!
//! - [`store`] - namespaced, atomically written JSON files with timestamps
//! - [`json_cache`] - fetch-or-load logic with stale fallback
//! - [`key`] - cache keys and namespaces (file extension + payload field)
//! - [`config`] - cache root and maximum age
//!
//! # Examples
//!
//! ```rust,no_run
//! use hitran_xsc::app::cache::{CacheConfig, CacheKey, DiskCacheStore, JsonCache};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CacheConfig::default();
//! let store = DiskCacheStore::new(&config).await?;
//!
//! let cache = JsonCache::load(
//!     &store,
//!     CacheKey::xscm(),
//!     || async { Ok::<_, hitran_xsc::errors::FetchError>(json!([])) },
//!     config.max_age,
//! )
//! .await;
//!
//! if cache.ok() {
//!     println!("{} bytes of metadata", cache.data()?.to_string().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod json_cache;
pub mod key;
pub mod store;

pub use config::CacheConfig;
pub use json_cache::{JsonCache, LoadSource};
pub use key::{CacheKey, CacheNamespace};
pub use store::{CacheEntry, CacheEntryInfo, DiskCacheStore};
