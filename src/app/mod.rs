//! Core application logic for HITRAN XSC
//!
//! This module contains the disk cache, the HITRAN client, the metadata
//! registry with its range filter, and the loader tying them together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hitran_xsc::app::{
//!     CacheConfig, ClientConfig, CrossSectionFilter, DiskCacheStore, HitranClient,
//!     MetaLoader, MetadataRegistry, MoleculeId,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache_config = CacheConfig::default();
//! let store = Arc::new(DiskCacheStore::new(&cache_config).await?);
//! let registry = Arc::new(MetadataRegistry::new());
//! let client = Arc::new(HitranClient::new(ClientConfig::default().with_api_key("KEY"))?);
//!
//! let loader = MetaLoader::with_client(store, Arc::clone(&registry), client, cache_config.max_age);
//! let ccl4 = loader.load(MoleculeId(104)).await;
//! println!("{} CCl4 cross-sections", ccl4.metas().len());
//!
//! let filter = CrossSectionFilter::new(MoleculeId(104))
//!     .with_wn_range("760..800".parse()?);
//! for filename in filter.matching_filenames(&registry).await {
//!     println!("{}", filename);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod meta;
pub mod models;
pub mod registry;

// Re-export main public API
pub use cache::{CacheConfig, CacheKey, DiskCacheStore, JsonCache, LoadSource};
pub use client::{ClientConfig, HitranClient};
pub use meta::{parse_records, CrossSectionMeta, MetaFetchFn, MetaLoader};
pub use models::{
    BoundRange, CrossSectionRecord, InMemoryMoleculeDirectory, MoleculeDirectory, MoleculeId,
};
pub use registry::{
    CrossSectionFilter, DedupPolicy, IngestReport, MetadataRegistry, MoleculeSummary,
    RegistryConfig,
};
