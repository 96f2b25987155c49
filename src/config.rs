//! Configuration management for HITRAN XSC
//!
//! This module provides TOML configuration with first-run initialization,
//! multi-location lookup and zero-config defaults. Every section and field is
//! optional; anything missing falls back to the built-in default.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{
    CacheConfig, ClientConfig, DedupPolicy, InMemoryMoleculeDirectory, MoleculeId,
    RegistryConfig,
};
use crate::constants::{cache, env as env_constants, hitran, http, limits};
use crate::errors::{AppError, ConfigError, Result};

/// Name of the project-local config file
const LOCAL_CONFIG_FILE: &str = "hitran-xsc.toml";

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Disk cache settings
    pub cache: CacheConfigToml,
    /// HITRAN API client settings
    pub client: ClientConfigToml,
    /// Metadata registry settings
    pub registry: RegistryConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Display names keyed by HITRAN molecule id
    pub molecules: BTreeMap<String, String>,
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path (None = OS cache dir)
    pub cache_root: Option<PathBuf>,
    /// Age after which cached metadata is re-fetched, e.g. "1day" or "12h"
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

impl Default for CacheConfigToml {
    fn default() -> Self {
        Self {
            cache_root: None,
            max_age: cache::DEFAULT_MAX_AGE,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// HITRAN web service root
    pub base_url: String,
    /// API key; `HITRAN_API_KEY` is used when unset
    pub api_key: Option<String>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            base_url: hitran::BASE_URL.to_string(),
            api_key: None,
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// TOML-friendly registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfigToml {
    /// "append" keeps every ingested record, "by_id" drops repeated ids
    pub dedup: DedupPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (CacheConfig, ClientConfig, RegistryConfig) {
        (
            self.cache_config(),
            self.client_config(),
            self.registry_config(),
        )
    }

    pub fn cache_config(&self) -> CacheConfig {
        self.cache.to_runtime_config()
    }

    /// Client settings, with the API key falling back to `HITRAN_API_KEY`
    pub fn client_config(&self) -> ClientConfig {
        let mut config = self.client.to_runtime_config();
        if config.api_key.is_none() {
            config.api_key = env::var(env_constants::API_KEY)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        config
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            dedup: self.registry.dedup,
        }
    }

    /// Molecule names from the `[molecules]` table
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a key is not a molecule id
    pub fn molecule_directory(&self) -> Result<InMemoryMoleculeDirectory> {
        self.molecules
            .iter()
            .map(|(id, name)| -> Result<(MoleculeId, String)> {
                let id: u32 = id.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    field: "molecules".to_string(),
                    value: id.clone(),
                    reason: "Keys must be numeric HITRAN molecule ids".to_string(),
                })?;
                Ok((MoleculeId(id), name.clone()))
            })
            .collect()
    }

    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. Config file (explicit path, else the first one found)
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file()?,
        };

        let Some(path) = config_path else {
            return Ok(Self::default());
        };

        if path.exists() {
            debug!("Loading config from: {}", path.display());
            Self::load_from_file(&path).await
        } else if config_file_override.is_some() {
            Err(ConfigError::NotFound { path }.into())
        } else {
            Ok(Self::default())
        }
    }

    /// Initialize configuration on first run
    ///
    /// Creates a default config file if none exists and notifies the user
    pub async fn initialize_first_run() -> Result<Option<PathBuf>> {
        let config_path = Self::get_default_config_path()?;

        if config_path.exists() {
            return Ok(Some(config_path));
        }

        info!("Creating default configuration file...");

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::generic(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to write config file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

        println!("📁 Created default configuration file:");
        println!("   {}", config_path.display());
        println!("   Add your HITRAN API key there or set {}.", env_constants::API_KEY);
        println!();

        Ok(Some(config_path))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Result<Option<PathBuf>> {
        let search_paths = [
            PathBuf::from(".").join(LOCAL_CONFIG_FILE),
            Self::get_default_config_path()?,
        ];

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Ok(Some(path));
            }
        }

        debug!("No config file found in standard locations");
        Ok(None)
    }

    /// Get the default config file path for the current user
    fn get_default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;

        Ok(config_dir.join(cache::APP_DIR_NAME).join("config.toml"))
    }

    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::InvalidFormat)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# HITRAN XSC Configuration
# This file was automatically generated on first run.
# You can customize any of these settings to suit your needs.

[cache]
# Cache directory (leave unset to use the system cache directory)
# cache_root = "/path/to/custom/cache"

# Cached metadata older than this is re-fetched (e.g. "12h", "7days")
max_age = "1day"

[client]
base_url = "{}"
# Personal API key from your HITRAN profile. When unset, {} is used.
# api_key = "..."
tcp_nodelay = true
pool_idle_timeout_secs = {}
pool_max_per_host = {}
request_timeout_secs = {}
connect_timeout_secs = {}
rate_limit_rps = {}

[registry]
# "append" keeps every record of every load, "by_id" drops repeated ids
dedup = "append"

[logging]
level = "info"  # error, warn, info, debug, trace

[molecules]
# Display names by HITRAN molecule id
"31" = "H2S"
"104" = "CCl4"
"#,
            hitran::BASE_URL,
            env_constants::API_KEY,
            http::POOL_IDLE_TIMEOUT.as_secs(),
            http::POOL_MAX_PER_HOST,
            http::DEFAULT_TIMEOUT.as_secs(),
            http::CONNECT_TIMEOUT.as_secs(),
            limits::DEFAULT_RATE_LIMIT_RPS,
        )
    }
}

impl CacheConfigToml {
    /// Convert to runtime CacheConfig
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig {
            cache_root: self.cache_root.clone(),
            max_age: self.max_age,
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            rate_limit_rps: self.rate_limit_rps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::MoleculeDirectory;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();

        assert_eq!(config.cache.max_age, cache::DEFAULT_MAX_AGE);
        assert_eq!(config.client.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
        assert_eq!(config.registry.dedup, DedupPolicy::Append);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content();

        let parsed: AppConfig = toml::from_str(&content).unwrap();

        assert_eq!(parsed.cache.max_age, cache::DEFAULT_MAX_AGE);
        assert_eq!(parsed.client.base_url, hitran::BASE_URL);
        assert!(parsed.client.api_key.is_none());
        assert!(content.contains("# HITRAN XSC Configuration"));

        let directory = parsed.molecule_directory().unwrap();
        assert_eq!(directory.name(MoleculeId(104)).as_deref(), Some("CCl4"));
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_config_loading_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let test_config = r#"
[cache]
cache_root = "/tmp/xsc-cache"
max_age = "12h"

[client]
api_key = "from-file"
rate_limit_rps = 5

[registry]
dedup = "by_id"

[logging]
level = "debug"
"#;

        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load(Some(config_path)).await.unwrap();

        assert_eq!(config.cache.max_age, Duration::from_secs(12 * 60 * 60));
        assert_eq!(config.registry.dedup, DedupPolicy::ById);
        assert_eq!(config.logging.level, "debug");
        // Unspecified values keep their defaults
        assert_eq!(config.client.base_url, hitran::BASE_URL);

        let (cache_config, client_config, registry_config) = config.to_runtime_config();
        assert_eq!(cache_config.cache_root, Some(PathBuf::from("/tmp/xsc-cache")));
        assert_eq!(client_config.api_key.as_deref(), Some("from-file"));
        assert_eq!(client_config.rate_limit_rps, 5);
        assert_eq!(registry_config.dedup, DedupPolicy::ById);
    }

    #[tokio::test]
    async fn test_invalid_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        tokio::fs::write(&config_path, "[cache\nmax_age = ")
            .await
            .unwrap();

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::InvalidFormat(_)))
        ));
    }

    #[test]
    fn test_bad_max_age_is_rejected() {
        let result: std::result::Result<AppConfig, _> =
            toml::from_str("[cache]\nmax_age = \"soon\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_non_numeric_molecule_key() {
        let config: AppConfig = toml::from_str("[molecules]\nwater = \"H2O\"\n").unwrap();
        assert!(matches!(
            config.molecule_directory(),
            Err(AppError::Config(ConfigError::InvalidValue { .. }))
        ));
    }
}
