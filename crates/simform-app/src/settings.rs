//! Application settings persisted as TOML in the user's config directory.
//!
//! Missing or unreadable files fall back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use simform_client::DEFAULT_MAX_AGE_DAYS;
use tracing::Level;

use crate::error::{AppError, Result};
use crate::logging::{LogConfig, LogFormat};

/// Application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub polling: PollingSettings,
    pub frame_cache: FrameCacheSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from the default path.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from a specific path.
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Save settings to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Io {
                operation: "create config directory",
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| AppError::Io {
            operation: "write settings",
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "Simform", "simform")
}

/// Simulation server connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Run polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Delay between status requests when the server does not suggest one.
    pub interval_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self { interval_ms: 2000 }
    }
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// On-disk frame cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameCacheSettings {
    pub enabled: bool,
    /// Overrides the platform cache directory.
    pub directory: Option<PathBuf>,
    pub max_age_days: i64,
}

impl Default for FrameCacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }
}

impl FrameCacheSettings {
    /// The cache directory: the override, else the platform cache directory.
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.cache_dir().join("frames"))
                .unwrap_or_else(|| PathBuf::from("frames"))
        })
    }

    /// Expiry for cached frames. `None` when `max_age_days` is out of range.
    pub fn max_age(&self) -> Option<chrono::TimeDelta> {
        chrono::TimeDelta::try_days(self.max_age_days)
    }
}

/// Log output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// One of error, warn, info, debug, trace.
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingSettings {
    /// Unknown level names fall back to `info`.
    pub fn log_config(&self) -> LogConfig {
        let level = self.level.parse().unwrap_or(Level::INFO);
        LogConfig::default()
            .with_level(level)
            .with_format(self.format)
            .with_ansi(self.file.is_none())
            .with_log_file(self.file.clone())
    }
}
