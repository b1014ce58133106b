//! Settings sections of the application configuration
//!
//! # Main Types
//!
//! - [`RecordingConfig`] - Where and how recordings are saved
//! - [`PlaybackConfig`] - How recordings are replayed
//! - [`LoggingConfig`] - Log filter and optional log directory

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Slowest allowed playback speed multiplier
pub const MIN_PLAYBACK_SPEED: f64 = 0.1;

/// Fastest allowed playback speed multiplier
pub const MAX_PLAYBACK_SPEED: f64 = 10.0;

/// Settings for recording sessions and the files they produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory history files are written to
    pub history_dir: PathBuf,

    /// File name prefix for new recordings
    pub file_prefix: String,

    /// chrono format string for the timestamp part of the file name
    pub timestamp_format: String,

    /// File extension, without the dot
    pub file_extension: String,

    /// Smallest value difference that counts as a change (0.0 = exact)
    pub change_tolerance: f64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            history_dir: super::default_history_dir(),
            file_prefix: "robotRec-".to_string(),
            timestamp_format: "%y%m%d_%H%M%S".to_string(),
            file_extension: "txt".to_string(),
            change_tolerance: 0.0,
        }
    }
}

/// Settings for replaying recordings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Speed multiplier (1.0 = real-time, 2.0 = twice as fast)
    pub speed: f64,
}

impl PlaybackConfig {
    /// Speed clamped to the supported range; NaN means real time
    pub fn effective_speed(&self) -> f64 {
        if self.speed.is_nan() {
            return 1.0;
        }
        self.speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

/// Settings for the tracing subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub filter: String,

    /// Write a daily-rolling log file here as well as to stderr
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,stateplay_rs=debug".to_string(),
            log_dir: None,
        }
    }
}
