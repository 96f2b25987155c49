//! Cross-section metadata loading
//!
//! Glue between the fetch-or-load cache and the registry. All molecules'
//! metadata lives in one `.xscm` cache file; loading it for any molecule
//! validates every record, merges the batch into the shared registry and
//! returns that molecule's view.
//!
//! The cached file looks like:
//!
//! ```json
//! {
//!     "timestamp": 1700000000.25,
//!     "metas": [
//!         {
//!             "id": 139, "molecule_id": 104,
//!             "numin": 750.0028, "numax": 811.995,
//!             "pressure": 757.7, "temperature": 296.7,
//!             "valid_from": "2000-05-04", "valid_to": "2012-12-31",
//!             "filename": "CCl4_296.7K-757.7Torr_750.0-812.0_00.xsc",
//!             "resolution": 0.03, "resolution_units": "cm-1",
//!             "broadener": "air", "source_id": 631,
//!             "sigma_max": 4.867e-18, "npnts": 6173
//!         }
//!     ]
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::app::cache::{CacheKey, DiskCacheStore, JsonCache, LoadSource};
use crate::app::client::HitranClient;
use crate::app::models::{CrossSectionRecord, MoleculeId};
use crate::app::registry::MetadataRegistry;
use crate::errors::{FetchResult, MetadataError};

/// Validate a cached or fetched payload into records
///
/// Each element is checked on its own; malformed ones are returned as errors
/// next to the valid records instead of failing the batch. A payload that is
/// not an array yields no records and a single error.
pub fn parse_records(payload: &Value) -> (Vec<CrossSectionRecord>, Vec<MetadataError>) {
    let Some(items) = payload.as_array() else {
        return (
            Vec::new(),
            vec![MetadataError::MalformedRecord {
                index: 0,
                reason: "payload is not an array of records".to_string(),
            }],
        );
    };

    let mut records = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match CrossSectionRecord::from_value(index, item) {
            Ok(record) => records.push(record),
            Err(e) => errors.push(e),
        }
    }
    (records, errors)
}

/// One molecule's cross-section metadata, as seen after a load
#[derive(Debug, Clone)]
pub struct CrossSectionMeta {
    molecule_id: MoleculeId,
    metas: Vec<CrossSectionRecord>,
    source: Option<LoadSource>,
    malformed_count: usize,
}

impl CrossSectionMeta {
    /// Load the shared metadata cache and ingest it into `registry`
    ///
    /// Never fails: when neither disk nor fetch yields data the failure is
    /// logged and the returned view is empty with `is_loaded() == false`.
    pub async fn load<F, Fut>(
        molecule_id: MoleculeId,
        store: &DiskCacheStore,
        registry: &MetadataRegistry,
        fetch: F,
        max_age: Duration,
    ) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<Value>>,
    {
        let cache = JsonCache::load(store, CacheKey::xscm(), fetch, max_age).await;
        Self::from_cache(molecule_id, cache, registry, false).await
    }

    /// Re-fetch the metadata and overwrite the registry entries it covers
    pub async fn refresh<F, Fut>(
        molecule_id: MoleculeId,
        store: &DiskCacheStore,
        registry: &MetadataRegistry,
        fetch: F,
    ) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<Value>>,
    {
        let cache = JsonCache::load_forced(store, CacheKey::xscm(), fetch).await;
        Self::from_cache(molecule_id, cache, registry, true).await
    }

    async fn from_cache(
        molecule_id: MoleculeId,
        cache: JsonCache,
        registry: &MetadataRegistry,
        replace: bool,
    ) -> Self {
        if !cache.ok() {
            error!("Failed to load xscm from cache");
            return Self::empty(molecule_id);
        }
        let source = cache.source();
        let Ok(payload) = cache.into_data() else {
            return Self::empty(molecule_id);
        };

        let (records, errors) = parse_records(&payload);
        for e in &errors {
            warn!("Skipping cross-section metadata: {}", e);
        }

        if replace {
            registry.replace(records).await;
        } else {
            registry.ingest(records).await;
        }

        let metas = registry.lookup(molecule_id).await;
        debug!(
            "Molecule {} has {} cross-sections after load",
            molecule_id,
            metas.len()
        );

        Self {
            molecule_id,
            metas,
            source,
            malformed_count: errors.len(),
        }
    }

    fn empty(molecule_id: MoleculeId) -> Self {
        Self {
            molecule_id,
            metas: Vec::new(),
            source: None,
            malformed_count: 0,
        }
    }

    pub fn molecule_id(&self) -> MoleculeId {
        self.molecule_id
    }

    /// Records for this molecule at the time of the load
    pub fn metas(&self) -> &[CrossSectionRecord] {
        &self.metas
    }

    pub fn filenames(&self) -> Vec<String> {
        self.metas.iter().map(|m| m.filename.clone()).collect()
    }

    /// False when neither disk nor the fetch produced data
    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn source(&self) -> Option<LoadSource> {
        self.source
    }

    /// Records skipped during validation
    pub fn malformed_count(&self) -> usize {
        self.malformed_count
    }
}

/// Shareable zero-argument fetch of the cross-section metadata payload
pub type MetaFetchFn = Arc<dyn Fn() -> BoxFuture<'static, FetchResult<Value>> + Send + Sync>;

/// Loads cross-section metadata on background tasks
///
/// Results come back through the returned [`JoinHandle`]. Dropping the handle
/// does not cancel the load; it still updates the disk cache and registry.
#[derive(Clone)]
pub struct MetaLoader {
    store: Arc<DiskCacheStore>,
    registry: Arc<MetadataRegistry>,
    fetch: MetaFetchFn,
    max_age: Duration,
}

impl MetaLoader {
    pub fn new(
        store: Arc<DiskCacheStore>,
        registry: Arc<MetadataRegistry>,
        fetch: MetaFetchFn,
        max_age: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            fetch,
            max_age,
        }
    }

    /// Loader fetching from the HITRAN API through `client`
    pub fn with_client(
        store: Arc<DiskCacheStore>,
        registry: Arc<MetadataRegistry>,
        client: Arc<HitranClient>,
        max_age: Duration,
    ) -> Self {
        let fetch: MetaFetchFn = Arc::new(move || {
            let client = Arc::clone(&client);
            async move { client.request_xsc_meta().await }.boxed()
        });
        Self::new(store, registry, fetch, max_age)
    }

    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<DiskCacheStore> {
        &self.store
    }

    /// Load on the current task
    pub async fn load(&self, molecule_id: MoleculeId) -> CrossSectionMeta {
        let fetch = Arc::clone(&self.fetch);
        CrossSectionMeta::load(
            molecule_id,
            &self.store,
            &self.registry,
            move || fetch(),
            self.max_age,
        )
        .await
    }

    /// Force a re-fetch on the current task
    pub async fn refresh(&self, molecule_id: MoleculeId) -> CrossSectionMeta {
        let fetch = Arc::clone(&self.fetch);
        CrossSectionMeta::refresh(molecule_id, &self.store, &self.registry, move || fetch()).await
    }

    /// Load on a spawned task
    pub fn spawn_load(&self, molecule_id: MoleculeId) -> JoinHandle<CrossSectionMeta> {
        let loader = self.clone();
        info!("Loading cross-section metadata for molecule {} in background", molecule_id);
        tokio::spawn(async move { loader.load(molecule_id).await })
    }
}

impl fmt::Debug for MetaLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaLoader")
            .field("store", &self.store)
            .field("registry", &self.registry)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}
