//! # Sync Configuration
//!
//! Configuration management for the sync engine and API client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LIFTLOG_API_URL=https://api.liftlog.app                            │
//! │     LIFTLOG_MAX_RETRIES=5                                              │
//! │     LIFTLOG_BASE_RETRY_DELAY_MS=30000                                  │
//! │     LIFTLOG_SYNC_TIMEOUT_SECS=60                                       │
//! │     LIFTLOG_DB_PATH=/data/liftlog.db                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/liftlog/sync.toml (Linux)                                │
//! │     ~/Library/Application Support/app.liftlog.liftlog/sync.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [api]
//! base_url = "https://api.liftlog.app"
//! request_timeout_secs = 30
//!
//! [sync]
//! max_retries = 5
//! base_retry_delay_ms = 30000
//! sync_timeout_secs = 60
//!
//! [storage]
//! database_path = "/home/me/.local/share/liftlog/liftlog.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use liftlog_core::RetryPolicy;

use crate::engine::EngineOptions;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// API Settings
// =============================================================================

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the workout API, without the `/api/...` path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Retry and timeout behavior of the synced-save engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Consecutive failures before automatic retries stop.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first automatic retry (milliseconds). Doubles after
    /// every further failure.
    #[serde(default = "default_base_retry_delay")]
    pub base_retry_delay_ms: u64,

    /// Upper bound on a single remote sync call (seconds).
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_retry_delay() -> u64 {
    30_000
}

fn default_sync_timeout() -> u64 {
    60
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            max_retries: default_max_retries(),
            base_retry_delay_ms: default_base_retry_delay(),
            sync_timeout_secs: default_sync_timeout(),
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the local database lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Explicit database file. `None` uses the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|name| std::env::var(name).ok());

        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        let url = url::Url::parse(&self.api.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.sync.max_retries == 0 {
            return Err(SyncError::InvalidConfig(
                "max_retries must be greater than 0".into(),
            ));
        }

        if self.sync.base_retry_delay_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "base_retry_delay_ms must be greater than 0".into(),
            ));
        }

        if self.sync.sync_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "sync_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// production). Unparsable numbers are ignored with a warning.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("LIFTLOG_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(value) = lookup("LIFTLOG_MAX_RETRIES") {
            match value.parse::<u32>() {
                Ok(n) => self.sync.max_retries = n,
                Err(_) => warn!(value = %value, "Ignoring invalid LIFTLOG_MAX_RETRIES"),
            }
        }

        if let Some(value) = lookup("LIFTLOG_BASE_RETRY_DELAY_MS") {
            match value.parse::<u64>() {
                Ok(ms) => self.sync.base_retry_delay_ms = ms,
                Err(_) => warn!(value = %value, "Ignoring invalid LIFTLOG_BASE_RETRY_DELAY_MS"),
            }
        }

        if let Some(value) = lookup("LIFTLOG_SYNC_TIMEOUT_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => self.sync.sync_timeout_secs = secs,
                Err(_) => warn!(value = %value, "Ignoring invalid LIFTLOG_SYNC_TIMEOUT_SECS"),
            }
        }

        if let Some(path) = lookup("LIFTLOG_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("app", "liftlog", "liftlog")
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Database file to open: the configured path, or `liftlog.db` in the
    /// platform data directory.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage
            .database_path
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join("liftlog.db")))
    }

    /// Retry policy for engine instances.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.sync.max_retries,
            Duration::from_millis(self.sync.base_retry_delay_ms),
        )
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.sync_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// Retry policy and sync timeout bundled for `SyncedSave::start`.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            retry: self.retry_policy(),
            sync_timeout: self.sync_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.sync.max_retries, 5);
        assert_eq!(config.sync.base_retry_delay_ms, 30_000);
        assert_eq!(config.sync.sync_timeout_secs, 60);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SyncConfig::default();

        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().unwrap_err().is_config_error());

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "https://api.example.com".to_string();
        assert!(config.validate().is_ok());

        config.sync.max_retries = 0;
        assert!(config.validate().is_err());

        config.sync.max_retries = 3;
        config.sync.base_retry_delay_ms = 0;
        assert!(config.validate().is_err());

        config.sync.base_retry_delay_ms = 10;
        config.sync.sync_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LIFTLOG_API_URL", "https://api.example.com"),
            ("LIFTLOG_MAX_RETRIES", "3"),
            ("LIFTLOG_BASE_RETRY_DELAY_MS", "oops"),
            ("LIFTLOG_DB_PATH", "/tmp/x.db"),
        ]
        .into_iter()
        .collect();

        let mut config = SyncConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.sync.max_retries, 3);
        assert_eq!(config.sync.base_retry_delay_ms, 30_000);
        assert_eq!(config.database_path(), Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SyncConfig = toml::from_str(
            r#"
            [sync]
            max_retries = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.max_retries, 2);
        assert_eq!(config.sync.sync_timeout_secs, 60);
        assert_eq!(config.api, ApiSettings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!("liftlog-sync-{}.toml", std::process::id()));

        let mut config = SyncConfig::default();
        config.sync.max_retries = 7;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: SyncConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.sync.max_retries, 7);

        let _ = std::fs::remove_file(&path);
    }
}
