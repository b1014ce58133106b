//! Configuration module for stateplay-rs
//!
//! The configuration is a single TOML file with three sections:
//!
//! ```toml
//! [recording]
//! history_dir = "/home/driver/.local/share/stateplay-rs/history"
//! file_prefix = "robotRec-"
//! timestamp_format = "%y%m%d_%H%M%S"
//! file_extension = "txt"
//! change_tolerance = 0.0
//!
//! [playback]
//! speed = 1.0
//!
//! [logging]
//! filter = "info,stateplay_rs=debug"
//! ```
//!
//! Every field is optional; missing fields take their defaults.
//!
//! # Locations
//!
//! The config file path is taken from the `STATEPLAY_CONFIG` environment
//! variable, or else the platform config directory:
//! - **Linux**: `~/.config/stateplay-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/stateplay-rs/config.toml`
//! - **Windows**: `%APPDATA%\stateplay-rs\config.toml`
//!
//! Recordings default to `<platform data dir>/stateplay-rs/history`.

pub mod settings;

pub use settings::*;

use crate::error::{ReplayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config and data directories
pub const APP_ID: &str = "stateplay-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "STATEPLAY_CONFIG";

// ==================== App Directories ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Default directory for recordings
///
/// Falls back to `./history` when the platform has no data directory.
pub fn default_history_dir() -> PathBuf {
    app_data_dir()
        .map(|p| p.join("history"))
        .unwrap_or_else(|| PathBuf::from("history"))
}

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

// ==================== App Config ====================

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Recording settings
    pub recording: RecordingConfig,
    /// Playback settings
    pub playback: PlaybackConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Path the config is read from: `STATEPLAY_CONFIG`, else the platform default
    pub fn resolve_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        default_config_path()
            .ok_or_else(|| ReplayError::Config("Could not determine config directory".to_string()))
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReplayError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ReplayError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load a config file, returning defaults if it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Self::default();
        }

        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save config to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ReplayError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ReplayError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            ReplayError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}
