//! Prelude module for HITRAN XSC
//!
//! Re-exports the items most integrations need, so that
//! `use hitran_xsc::prelude::*;` is enough for typical usage.
//!
//! # Usage
//!
//! ```rust,no_run
//! use hitran_xsc::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let cache_config = config.cache_config();
//!     let store = Arc::new(DiskCacheStore::new(&cache_config).await?);
//!     let registry = Arc::new(MetadataRegistry::with_config(config.registry_config()));
//!     let client = Arc::new(HitranClient::new(config.client_config())?);
//!
//!     let loader = MetaLoader::with_client(store, registry, client, cache_config.max_age);
//!     let meta = loader.load(MoleculeId(104)).await;
//!     println!("{:?}", meta.filenames());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::{
    // Caching
    CacheConfig,
    CacheKey,
    DiskCacheStore,
    JsonCache,
    LoadSource,

    // Remote access
    ClientConfig,
    HitranClient,

    // Metadata
    BoundRange,
    CrossSectionFilter,
    CrossSectionMeta,
    CrossSectionRecord,
    DedupPolicy,
    MetaLoader,
    MetadataRegistry,
    MoleculeDirectory,
    MoleculeId,
    RegistryConfig,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_MAX_AGE, DEFAULT_RATE_LIMIT_RPS, ENV_API_KEY, USER_AGENT};

pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
