//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use smartfarm_core::{DevicePath, ThresholdConfig};
use smartfarm_types::TimeRange;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Realtime database root URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Path of the monitored device inside the database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_path: Option<String>,

    /// Window shown when the dashboard opens
    #[serde(default)]
    pub default_range: TimeRange,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optimal ranges for the threshold cards
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            device_path: None,
            default_range: TimeRange::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smartfarm")
            .join("config.toml")
    }

    /// Load config from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Load config from `path` or the default location, falling back to
    /// the defaults with a warning if the file is unreadable.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::path);
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}", e);
                Self::default()
            }
        }
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Resolve the database URL from arg/env or config.
pub fn resolve_database_url(arg: Option<String>, config: &Config) -> Option<String> {
    arg.filter(|url| !url.trim().is_empty())
        .or_else(|| config.database_url.clone())
}

/// Resolve the device path from arg/env or config, falling back to the
/// deployment default.
pub fn resolve_device(arg: Option<String>, config: &Config) -> DevicePath {
    arg.or_else(|| config.device_path.clone())
        .map(DevicePath::new)
        .unwrap_or_default()
}

/// Resolve the dashboard window: explicit arg wins over config.
pub fn resolve_range(arg: Option<TimeRange>, config: &Config) -> TimeRange {
    arg.unwrap_or(config.default_range)
}
