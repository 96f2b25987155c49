//! Cache keys and namespaces
//!
//! A namespace fixes the file extension of a cache domain and the name of the
//! envelope field holding its payload. Both are part of the on-disk contract.

use std::fmt;

use crate::constants::cache;

/// A cache domain: file extension plus payload envelope field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheNamespace {
    /// File extension including the leading dot (e.g. ".xscm")
    pub extension: &'static str,
    /// JSON field holding the payload next to "timestamp"
    pub payload_field: &'static str,
}

impl CacheNamespace {
    /// Cross-section metadata
    pub const XSCM: CacheNamespace = CacheNamespace {
        extension: cache::XSCM_EXTENSION,
        payload_field: cache::XSCM_PAYLOAD_FIELD,
    };

    /// Every namespace this crate persists; files of other types are not ours
    pub const KNOWN: &'static [CacheNamespace] = &[CacheNamespace::XSCM];

    pub const fn new(extension: &'static str, payload_field: &'static str) -> Self {
        Self {
            extension,
            payload_field,
        }
    }
}

/// Whether `file_name` is a cache file or a leftover temp file of one
pub fn is_cache_file_name(file_name: &str) -> bool {
    CacheNamespace::KNOWN.iter().any(|ns| {
        file_name.ends_with(ns.extension)
            || (file_name.ends_with(cache::TEMP_FILE_SUFFIX)
                && file_name.contains(&format!("{}.", ns.extension)))
    })
}

/// Address of one persisted cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub namespace: CacheNamespace,
    pub name: String,
}

impl CacheKey {
    pub fn new(namespace: CacheNamespace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    /// Key of the shared cross-section metadata cache
    pub fn xscm() -> Self {
        Self::new(CacheNamespace::XSCM, cache::XSCM_NAME)
    }

    /// File name under the cache root
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name, self.namespace.extension)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
