//! The webnest configuration file.

use crate::error::ConfigError;
use crate::types::{LogLevel, UpdateCheckFrequency};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration, stored as YAML.
///
/// Every field has a default, so a partial (or empty) file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store file override (default: `<data_dir>/store.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_file: Option<String>,

    /// Partition root override (default: `<data_dir>/partitions`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitions_dir: Option<String>,

    /// Upper bound on a single partition storage clear
    #[serde(default = "crate::defaults::storage_clear_timeout_secs")]
    pub storage_clear_timeout_secs: u64,

    /// Debug log verbosity
    #[serde(default = "crate::defaults::log_level")]
    pub log_level: LogLevel,

    #[serde(default)]
    pub updates: UpdateConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_file: None,
            partitions_dir: None,
            storage_clear_timeout_secs: crate::defaults::storage_clear_timeout_secs(),
            log_level: crate::defaults::log_level(),
            updates: UpdateConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage_clear_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_clear_timeout_secs)
    }

    /// Semantic checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_clear_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "storage_clear_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let feed = url::Url::parse(&self.updates.feed_url).map_err(|e| {
            ConfigError::Validation(format!(
                "updates.feed_url '{}' is not a valid URL: {e}",
                self.updates.feed_url
            ))
        })?;
        if feed.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "updates.feed_url must use https, got '{}'",
                feed.scheme()
            )));
        }

        Ok(())
    }
}

/// Configuration for automatic update checking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// How often to check for new releases
    #[serde(default = "crate::defaults::update_check_frequency")]
    pub update_check_frequency: UpdateCheckFrequency,

    /// RFC 3339 timestamp of the last update check (auto-managed)
    #[serde(default)]
    pub last_update_check: Option<String>,

    /// Release manifest polled by the update feed
    #[serde(default = "crate::defaults::feed_url")]
    pub feed_url: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            update_check_frequency: crate::defaults::update_check_frequency(),
            last_update_check: None,
            feed_url: crate::defaults::feed_url(),
        }
    }
}

/// Crash/error telemetry forwarding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Forward reported events to the telemetry log file
    #[serde(default = "crate::defaults::bool_true")]
    pub enabled: bool,

    /// Telemetry log override (default: `<data_dir>/telemetry.jsonl`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: None,
        }
    }
}
