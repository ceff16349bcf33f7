//! Configuration loading for sync-client.
//!
//! Configuration is loaded from a TOML file (default: `offsync.toml`).
//! Every section and field is optional.

use offsync_core::{FeatureGate, DEFAULT_OFFLINE_FEATURES};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Root configuration for the offline layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfflineConfig {
    /// Storage key layout and budgets.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Drain configuration.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Feature gate configuration.
    #[serde(default)]
    pub gate: GateConfig,
    /// Automatic retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Key holding the serialized action queue.
    #[serde(default = "default_queue_key")]
    pub queue_key: String,
    /// Key holding the serialized offline snapshot.
    #[serde(default = "default_snapshot_key")]
    pub snapshot_key: String,
    /// Key reserved for free-form settings.
    #[serde(default = "default_settings_key")]
    pub settings_key: String,
    /// Maximum serialized snapshot size in bytes (default: 5MB).
    #[serde(default = "default_max_snapshot_bytes")]
    pub max_snapshot_bytes: usize,
}

/// Drain configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Deadline for one remote submission in milliseconds (default: 10s).
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,
    /// Start a drain whenever an action is queued while online (default: true).
    #[serde(default = "default_drain_on_enqueue")]
    pub drain_on_enqueue: bool,
}

/// Feature gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Features usable while offline.
    #[serde(default = "default_offline_features")]
    pub offline_features: Vec<String>,
}

/// Automatic retry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Schedule a delayed re-drain after a failure (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// Give up after this many consecutive failed retries (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

// Default value functions
fn default_queue_key() -> String {
    "offsync.outbox".to_string()
}

fn default_snapshot_key() -> String {
    "offsync.snapshot".to_string()
}

fn default_settings_key() -> String {
    "offsync.settings".to_string()
}

fn default_max_snapshot_bytes() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_submit_timeout_ms() -> u64 {
    10_000
}

fn default_drain_on_enqueue() -> bool {
    true
}

fn default_offline_features() -> Vec<String> {
    DEFAULT_OFFLINE_FEATURES
        .iter()
        .map(|f| f.to_string())
        .collect()
}

fn default_max_attempts() -> u32 {
    5
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            queue_key: default_queue_key(),
            snapshot_key: default_snapshot_key(),
            settings_key: default_settings_key(),
            max_snapshot_bytes: default_max_snapshot_bytes(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            submit_timeout_ms: default_submit_timeout_ms(),
            drain_on_enqueue: default_drain_on_enqueue(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            offline_features: default_offline_features(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: default_max_attempts(),
        }
    }
}

impl SyncConfig {
    /// The submission deadline as a [`Duration`].
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}

impl OfflineConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Build the feature gate described by `[gate]`.
    pub fn feature_gate(&self) -> FeatureGate {
        FeatureGate::new(self.gate.offline_features.iter().cloned())
    }

    /// Set the submission deadline.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.sync.submit_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable automatic retry with the given attempt limit.
    pub fn with_retry(mut self, max_attempts: u32) -> Self {
        self.retry.enabled = true;
        self.retry.max_attempts = max_attempts;
        self
    }
}
