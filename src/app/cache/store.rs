//! Disk-backed JSON cache store
//!
//! Every cache key maps to one file under the cache root holding a JSON
//! envelope `{"timestamp": <unix seconds>, "<payload_field>": <payload>}`.
//! Writes go through a temp file + rename so a reader never sees a partially
//! written entry; a failed write leaves the previous entry untouched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::constants::cache;
use crate::errors::{CacheError, CacheResult};

use super::config::CacheConfig;
use super::key::{is_cache_file_name, CacheKey};

static WRITE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A payload read back from disk together with its write time
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

impl CacheEntry {
    /// Age of the entry at `now`; entries stamped in the future have age zero
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        age_between(self.timestamp, now)
    }

    /// `now - timestamp < max_age`
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.is_fresh_at(max_age, Utc::now())
    }

    pub fn is_fresh_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.age_at(now) < max_age
    }
}

/// Summary of a cache file, used for inspection
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    /// None when the file has no readable timestamp
    pub timestamp: Option<DateTime<Utc>>,
}

impl CacheEntryInfo {
    pub fn is_fresh_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.timestamp
            .map(|ts| age_between(ts, now) < max_age)
            .unwrap_or(false)
    }
}

fn age_between(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(timestamp)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

fn timestamp_to_secs(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp_micros() as f64 / 1_000_000.0
}

fn secs_to_timestamp(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Namespaced key-value store for JSON payloads
#[derive(Debug)]
pub struct DiskCacheStore {
    root: PathBuf,
}

impl DiskCacheStore {
    /// Create a store rooted at the configured (or OS default) directory
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the cache directory cannot be created
    pub async fn new(config: &CacheConfig) -> CacheResult<Self> {
        let root = match &config.cache_root {
            Some(path) => path.clone(),
            None => Self::get_default_cache_dir()?,
        };

        Self::ensure_directory_exists(&root).await?;

        info!("Initialized cache store with root: {}", root.display());
        Ok(Self { root })
    }

    /// Get the cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Default location: `<os cache dir>/hitran-xsc/xsc`
    fn get_default_cache_dir() -> CacheResult<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| CacheError::DirectoryNotAccessible {
                path: PathBuf::from("system cache directory"),
            })?
            .join(cache::APP_DIR_NAME)
            .join(cache::XSC_DIR_NAME);

        Ok(cache_dir)
    }

    async fn ensure_directory_exists(path: &Path) -> CacheResult<()> {
        if !path.exists() {
            fs::create_dir_all(path).await.map_err(|e| {
                error!("Failed to create cache directory: {}", e);
                CacheError::DirectoryNotAccessible {
                    path: path.to_path_buf(),
                }
            })?;
            debug!("Created cache directory: {}", path.display());
        }
        Ok(())
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// Read the entry stored under `key`
    ///
    /// # Errors
    ///
    /// Returns `CacheError::NotFound` if the file is absent, unreadable or
    /// malformed. A malformed file is reported but never fatal.
    pub async fn read(&self, key: &CacheKey) -> CacheResult<CacheEntry> {
        let path = self.path_for(key);
        let not_found = || CacheError::NotFound {
            key: key.to_string(),
        };

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache entry for {}", key);
                return Err(not_found());
            }
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return Err(not_found());
            }
        };

        match parse_envelope(&bytes, key.namespace.payload_field) {
            Ok(entry) => {
                debug!("Read cache entry {} (written {})", key, entry.timestamp);
                Ok(entry)
            }
            Err(reason) => {
                warn!(
                    "Ignoring malformed cache file {}: {}",
                    path.display(),
                    reason
                );
                Err(not_found())
            }
        }
    }

    /// Store `payload` under `key`, stamped with the current time
    pub async fn write(&self, key: &CacheKey, payload: &Value) -> CacheResult<()> {
        self.write_at(key, payload, Utc::now()).await
    }

    /// Store `payload` under `key` with an explicit timestamp
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the temp file cannot be written or renamed; the
    /// previous entry (if any) is left in place.
    pub async fn write_at(
        &self,
        key: &CacheKey,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> CacheResult<()> {
        let mut envelope = Map::new();
        envelope.insert(
            cache::TIMESTAMP_FIELD.to_string(),
            Value::from(timestamp_to_secs(timestamp)),
        );
        envelope.insert(key.namespace.payload_field.to_string(), payload.clone());
        let content = serde_json::to_vec(&Value::Object(envelope))?;

        Self::ensure_directory_exists(&self.root).await?;

        let final_path = self.path_for(key);
        let temp_path = self.temp_path_for(&final_path);

        if let Err(e) = fs::write(&temp_path, &content).await {
            error!("Failed to write temporary cache file: {}", e);
            let _ = fs::remove_file(&temp_path).await;
            return Err(CacheError::Io(e));
        }

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            error!("Failed to rename temporary cache file: {}", e);
            let _ = fs::remove_file(&temp_path).await;
            return Err(CacheError::AtomicWriteFailed {
                temp_path,
                final_path,
            });
        }

        debug!("Wrote cache entry {} ({} bytes)", key, content.len());
        Ok(())
    }

    /// Unique sibling temp file so concurrent writers never share one
    fn temp_path_for(&self, final_path: &Path) -> PathBuf {
        temp_path_with(final_path, WRITE_SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }

    /// Remove the entry stored under `key`, returning whether one existed
    pub async fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => {
                debug!("Removed cache entry {}", key);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// List cache files under the root, sorted by file name
    ///
    /// Only files of a known namespace are listed; leftover temp files and
    /// anything else sharing the directory are skipped.
    pub async fn entries(&self) -> CacheResult<Vec<CacheEntryInfo>> {
        let mut infos = Vec::new();
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(infos),
            Err(e) => return Err(CacheError::Io(e)),
        };

        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !is_cache_file_name(&file_name) || file_name.ends_with(cache::TEMP_FILE_SUFFIX) {
                continue;
            }

            let timestamp = fs::read(entry.path())
                .await
                .ok()
                .and_then(|bytes| read_timestamp(&bytes));

            infos.push(CacheEntryInfo {
                path: entry.path(),
                file_name,
                size_bytes: metadata.len(),
                timestamp,
            });
        }

        infos.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(infos)
    }

    /// Remove every cache file, including leftover temp files
    ///
    /// Files that do not belong to a known namespace are left alone, so the
    /// root may safely be a shared directory.
    pub async fn clear(&self) -> CacheResult<usize> {
        let mut removed = 0;
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::Io(e)),
        };

        while let Some(entry) = dir.next_entry().await? {
            if !entry.metadata().await?.is_file() {
                continue;
            }
            if !is_cache_file_name(&entry.file_name().to_string_lossy()) {
                debug!("Leaving foreign file {}", entry.path().display());
                continue;
            }
            fs::remove_file(entry.path()).await?;
            removed += 1;
        }

        if removed > 0 {
            info!("Removed {} cache files from {}", removed, self.root.display());
        }
        Ok(removed)
    }
}

fn temp_path_with(final_path: &Path, sequence: u64) -> PathBuf {
    let file_name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    final_path.with_file_name(format!(
        "{}.{}-{}{}",
        file_name,
        std::process::id(),
        sequence,
        cache::TEMP_FILE_SUFFIX
    ))
}

fn read_timestamp(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    value
        .get(cache::TIMESTAMP_FIELD)
        .and_then(Value::as_f64)
        .and_then(secs_to_timestamp)
}

fn parse_envelope(bytes: &[u8], payload_field: &str) -> Result<CacheEntry, String> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    let mut object = match value {
        Value::Object(object) => object,
        _ => return Err("top-level value is not an object".to_string()),
    };

    let timestamp = object
        .get(cache::TIMESTAMP_FIELD)
        .and_then(Value::as_f64)
        .ok_or_else(|| format!("missing or non-numeric '{}'", cache::TIMESTAMP_FIELD))?;
    let timestamp = secs_to_timestamp(timestamp)
        .ok_or_else(|| format!("timestamp {} out of range", timestamp))?;

    let payload = object
        .remove(payload_field)
        .ok_or_else(|| format!("missing payload field '{}'", payload_field))?;

    Ok(CacheEntry { timestamp, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::cache::key::CacheNamespace;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use tempfile::TempDir;

    async fn create_store(temp_dir: &TempDir) -> DiskCacheStore {
        let config = CacheConfig::with_cache_root(temp_dir.path().to_path_buf());
        DiskCacheStore::new(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_store_creation() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("xsc");
        let config = CacheConfig::with_cache_root(root.clone());

        let store = DiskCacheStore::new(&config).await.unwrap();
        assert_eq!(store.root(), root.as_path());
        assert!(root.exists());
    }

    #[tokio::test]
    async fn test_read_missing_key_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;

        let result = store.read(&CacheKey::xscm()).await;
        assert!(matches!(result, Err(CacheError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;
        let key = CacheKey::xscm();
        let payload = json!([{"molecule_id": 104, "filename": "a.xsc"}, {"nested": {"x": [1, 2.5, null]}}]);

        store.write(&key, &payload).await.unwrap();
        let entry = store.read(&key).await.unwrap();

        assert_eq!(entry.payload, payload);
        assert!(entry.is_fresh(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_envelope_format_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;
        let key = CacheKey::xscm();

        store.write(&key, &json!([])).await.unwrap();

        let raw: Value =
            serde_json::from_slice(&std::fs::read(store.path_for(&key)).unwrap()).unwrap();
        assert!(raw["timestamp"].is_number());
        assert_eq!(raw["metas"], json!([]));
        assert_eq!(raw.as_object().unwrap().len(), 2);
        assert!(store.path_for(&key).ends_with("cross_sections.xscm"));
    }

    #[tokio::test]
    async fn test_reads_integer_timestamps_written_elsewhere() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;
        let key = CacheKey::xscm();

        std::fs::write(
            store.path_for(&key),
            r#"{"timestamp": 143145, "metas": [{"id": 139}]}"#,
        )
        .unwrap();

        let entry = store.read(&key).await.unwrap();
        assert_eq!(entry.timestamp.timestamp(), 143145);
        assert_eq!(entry.payload, json!([{"id": 139}]));
        assert!(!entry.is_fresh(Duration::from_secs(86_400)));
    }

    #[tokio::test]
    async fn test_malformed_files_are_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;
        let key = CacheKey::xscm();

        for content in [
            "not json at all",
            r#"[1, 2, 3]"#,
            r#"{"metas": []}"#,
            r#"{"timestamp": "yesterday", "metas": []}"#,
            r#"{"timestamp": 1700000000}"#,
        ] {
            std::fs::write(store.path_for(&key), content).unwrap();
            let result = store.read(&key).await;
            assert!(
                matches!(result, Err(CacheError::NotFound { .. })),
                "content {:?} should read as not found",
                content
            );
        }
    }

    #[tokio::test]
    async fn test_payload_field_belongs_to_namespace() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;
        let other = CacheKey::new(CacheNamespace::new(".xscm", "molecules"), "cross_sections");

        store.write(&CacheKey::xscm(), &json!([1])).await.unwrap();

        // Same file, different envelope field: treated as absent
        assert!(matches!(
            store.read(&other).await,
            Err(CacheError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_freshness_boundaries() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;
        let one_day = Duration::from_secs(24 * 60 * 60);
        let now = Utc::now();

        let old = CacheKey::new(CacheNamespace::XSCM, "old");
        let recent = CacheKey::new(CacheNamespace::XSCM, "recent");
        store
            .write_at(&old, &json!("old"), now - ChronoDuration::days(2))
            .await
            .unwrap();
        store
            .write_at(&recent, &json!("recent"), now - ChronoDuration::hours(1))
            .await
            .unwrap();

        let old_entry = store.read(&old).await.unwrap();
        let recent_entry = store.read(&recent).await.unwrap();
        assert!(!old_entry.is_fresh_at(one_day, now));
        assert!(recent_entry.is_fresh_at(one_day, now));
        assert!(recent_entry.age_at(now) >= Duration::from_secs(3599));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let now = Utc::now();
        let entry = CacheEntry {
            timestamp: now + ChronoDuration::hours(3),
            payload: json!(null),
        };
        assert_eq!(entry.age_at(now), Duration::ZERO);
        assert!(entry.is_fresh_at(Duration::from_secs(1), now));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_entry_and_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;
        let key = CacheKey::xscm();

        store.write(&key, &json!([1])).await.unwrap();
        store.write(&key, &json!([2])).await.unwrap();

        assert_eq!(store.read(&key).await.unwrap().payload, json!([2]));
        let names: Vec<String> = std::fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["cross_sections.xscm".to_string()]);
    }

    fn temp_file_count(store: &DiskCacheStore) -> usize {
        std::fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.metadata().unwrap().is_file())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .ends_with(cache::TEMP_FILE_SUFFIX)
            })
            .count()
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;
        let key = CacheKey::xscm();
        store.write(&key, &json!(["kept"])).await.unwrap();

        // Directories on the next temp paths make the temp file write fail
        let final_path = store.path_for(&key);
        let next = WRITE_SEQUENCE.load(Ordering::SeqCst);
        for sequence in next..next + 1000 {
            std::fs::create_dir(temp_path_with(&final_path, sequence)).unwrap();
        }

        let result = store.write(&key, &json!(["replaced"])).await;
        assert!(matches!(result, Err(CacheError::Io(_))));
        assert_eq!(store.read(&key).await.unwrap().payload, json!(["kept"]));
        assert_eq!(temp_file_count(&store), 0);
    }

    #[tokio::test]
    async fn test_failed_rename_cleans_up_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;

        // A non-empty directory at the final path makes the rename fail
        let blocked = CacheKey::new(CacheNamespace::XSCM, "blocked");
        std::fs::create_dir(store.path_for(&blocked)).unwrap();
        std::fs::write(store.path_for(&blocked).join("child"), b"x").unwrap();

        let result = store.write(&blocked, &json!(["lost"])).await;
        assert!(matches!(result, Err(CacheError::AtomicWriteFailed { .. })));
        assert!(store.path_for(&blocked).is_dir());
        assert_eq!(temp_file_count(&store), 0);
    }

    #[tokio::test]
    async fn test_remove_entries_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;
        let a = CacheKey::new(CacheNamespace::XSCM, "a");
        let b = CacheKey::new(CacheNamespace::XSCM, "b");

        store.write(&a, &json!(1)).await.unwrap();
        store.write(&b, &json!(2)).await.unwrap();
        std::fs::write(store.root().join("junk.xscm"), "garbage").unwrap();

        let entries = store.entries().await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.xscm", "b.xscm", "junk.xscm"]);
        assert!(entries[0].timestamp.is_some());
        assert!(entries[2].timestamp.is_none());
        assert!(!entries[2].is_fresh_at(Duration::from_secs(60), Utc::now()));

        assert!(store.remove(&a).await.unwrap());
        assert!(!store.remove(&a).await.unwrap());

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_leaves_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir).await;
        let thesis = store.root().join("thesis.docx");
        let leftover = store.root().join("cross_sections.xscm.1-0.tmp");
        std::fs::write(&thesis, b"years of work").unwrap();
        std::fs::write(&leftover, b"partial").unwrap();
        store.write(&CacheKey::xscm(), &json!([])).await.unwrap();

        let names: Vec<String> = store
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.file_name)
            .collect();
        assert_eq!(names, vec!["cross_sections.xscm".to_string()]);

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(thesis.exists());
        assert!(!leftover.exists());
        assert_eq!(std::fs::read(&thesis).unwrap(), b"years of work");
    }
}
