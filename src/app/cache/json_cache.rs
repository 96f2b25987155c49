//! Fetch-or-load JSON cache
//!
//! [`JsonCache`] answers "give me the current data for this key" without the
//! caller knowing whether it came from disk or from the network. Fresh disk
//! entries are used as-is; missing or stale ones trigger the injected fetch,
//! whose result is written back. When the fetch fails a stale payload is
//! still served. Failures never propagate out of [`JsonCache::load`]; they are
//! logged and reported through [`JsonCache::ok`].

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::errors::{CacheError, CacheResult, FetchResult};

use super::key::CacheKey;
use super::store::DiskCacheStore;

/// Where the loaded payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Fresh entry read from disk
    Disk,
    /// Fetched from the remote collaborator and written to disk
    Remote,
    /// Fetch failed; stale disk entry served instead
    StaleFallback,
}

/// Result of one fetch-or-load cycle for a cache key
#[derive(Debug, Clone)]
pub struct JsonCache {
    key: CacheKey,
    data: Option<Value>,
    source: Option<LoadSource>,
}

impl JsonCache {
    /// Load `key`, fetching when the disk entry is missing or older than `max_age`
    ///
    /// The load runs eagerly and exactly once. It never fails; check
    /// [`ok`](Self::ok) before calling [`data`](Self::data).
    pub async fn load<F, Fut>(
        store: &DiskCacheStore,
        key: CacheKey,
        fetch: F,
        max_age: Duration,
    ) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<Value>>,
    {
        Self::run(store, key, fetch, max_age, false).await
    }

    /// Like [`load`](Self::load) but always fetches, even over a fresh entry
    ///
    /// Any disk entry is still kept as the fallback if the fetch fails.
    pub async fn load_forced<F, Fut>(store: &DiskCacheStore, key: CacheKey, fetch: F) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<Value>>,
    {
        Self::run(store, key, fetch, Duration::ZERO, true).await
    }

    async fn run<F, Fut>(
        store: &DiskCacheStore,
        key: CacheKey,
        fetch: F,
        max_age: Duration,
        force: bool,
    ) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<Value>>,
    {
        let fallback = match store.read(&key).await {
            Ok(entry) if !force && entry.is_fresh(max_age) => {
                debug!("Cache hit for {}", key);
                return Self::loaded(key, entry.payload, LoadSource::Disk);
            }
            Ok(entry) => {
                if !force {
                    info!(
                        "Cache entry {} is stale (written {}), refreshing",
                        key, entry.timestamp
                    );
                }
                Some(entry.payload)
            }
            Err(CacheError::NotFound { .. }) => {
                info!("No cached data for {}, fetching", key);
                None
            }
            Err(e) => {
                warn!("Cache read for {} failed: {}", key, e);
                None
            }
        };

        match fetch().await {
            Ok(data) => {
                if let Err(e) = store.write(&key, &data).await {
                    warn!("Fetched {} but could not persist it: {}", key, e);
                }
                info!("Fetched fresh data for {}", key);
                Self::loaded(key, data, LoadSource::Remote)
            }
            Err(e) => match fallback {
                Some(stale) => {
                    warn!("Fetch for {} failed ({}), serving stale cache entry", key, e);
                    Self::loaded(key, stale, LoadSource::StaleFallback)
                }
                None => {
                    error!("Fetch for {} failed and no cached copy exists: {}", key, e);
                    Self {
                        key,
                        data: None,
                        source: None,
                    }
                }
            },
        }
    }

    fn loaded(key: CacheKey, data: Value, source: LoadSource) -> Self {
        Self {
            key,
            data: Some(data),
            source: Some(source),
        }
    }

    /// True when a payload is available (disk hit, fetch, or stale fallback)
    pub fn ok(&self) -> bool {
        self.data.is_some()
    }

    /// The loaded payload
    ///
    /// # Errors
    ///
    /// Returns `CacheError::NotLoaded` when the load failed; callers are
    /// expected to check [`ok`](Self::ok) first.
    pub fn data(&self) -> CacheResult<&Value> {
        self.data.as_ref().ok_or_else(|| self.not_loaded())
    }

    /// Consume the cache and take its payload
    pub fn into_data(self) -> CacheResult<Value> {
        match self.data {
            Some(data) => Ok(data),
            None => Err(self.not_loaded()),
        }
    }

    fn not_loaded(&self) -> CacheError {
        error!("data() called on {} which failed to load", self.key);
        CacheError::NotLoaded {
            key: self.key.to_string(),
        }
    }

    pub fn source(&self) -> Option<LoadSource> {
        self.source
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}
