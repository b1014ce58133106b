//! History file storage
//!
//! A [`HistoryStore`] is a directory of history text files. New recordings
//! are named `<prefix><timestamp>.<ext>` (for example
//! `robotRec-240315_143000.txt`), so the newest recording is also the most
//! recently modified file.
//!
//! Writing is best effort: a recording is already in memory when it is
//! saved, so [`HistoryStore::write_history`] logs a failure and carries on.
//! Reading is strict, since playback cannot proceed without the file.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::RecordingConfig;
use crate::error::{ReplayError, Result, ResultExt};
use crate::history::{self, HistoryTable};

/// Directory of saved history files
#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
    prefix: String,
    timestamp_format: String,
    extension: String,
}

impl HistoryStore {
    /// Create a store with the default naming scheme
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(&RecordingConfig {
            history_dir: root.into(),
            ..RecordingConfig::default()
        })
    }

    /// Create a store from recording settings
    pub fn from_config(config: &RecordingConfig) -> Self {
        Self {
            root: config.history_dir.clone(),
            prefix: config.file_prefix.clone(),
            timestamp_format: config.timestamp_format.clone(),
            extension: config.file_extension.trim_start_matches('.').to_string(),
        }
    }

    /// Directory this store reads and writes
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save a table under a fresh timestamped name
    ///
    /// Returns `None` and logs a warning if the file could not be written.
    pub fn write_history(&self, table: &HistoryTable) -> Option<PathBuf> {
        tracing::debug!("Saving history:\n{}", history::serialize(table));

        let path = self.next_path();
        match self.write_history_to(&path, table) {
            Ok(()) => {
                tracing::info!("Saved {} rows to {:?}", table.row_count(), path);
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Recording kept in memory only: {}", e);
                None
            }
        }
    }

    /// Save a table at an exact path, creating parent directories
    pub fn write_history_to(&self, path: impl AsRef<Path>, table: &HistoryTable) -> Result<()> {
        let path = path.as_ref();
        let storage_err = |e: std::io::Error| ReplayError::Storage {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(storage_err)?;
        }
        std::fs::write(path, history::serialize(table)).map_err(storage_err)
    }

    /// Load and parse a history file
    pub fn read_history(&self, path: impl AsRef<Path>) -> Result<HistoryTable> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ReplayError::Storage {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        history::parse(&text).with_context(|| format!("Failed to load history {:?}", path))
    }

    /// Every file in the store, oldest first by modification time
    pub fn list_histories(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((modified, entry.path()));
        }

        entries.sort();
        Ok(entries.into_iter().map(|(_, path)| path).collect())
    }

    /// The most recently modified file in the store
    pub fn latest_history(&self) -> Result<Option<PathBuf>> {
        Ok(self.list_histories()?.pop())
    }

    /// Timestamped path that does not exist yet
    fn next_path(&self) -> PathBuf {
        let stamp = self.timestamp();
        let base = format!("{}{}", self.prefix, stamp);

        let mut path = self.root.join(format!("{}.{}", base, self.extension));
        let mut n = 1;
        while path.exists() {
            path = self.root.join(format!("{}_{}.{}", base, n, self.extension));
            n += 1;
        }
        path
    }

    fn timestamp(&self) -> String {
        let now = chrono::Local::now();
        let mut stamp = String::new();
        if write!(stamp, "{}", now.format(&self.timestamp_format)).is_err() {
            tracing::warn!(
                "Invalid timestamp format {:?}, using the default",
                self.timestamp_format
            );
            stamp = now.format("%y%m%d_%H%M%S").to_string();
        }
        stamp
    }
}
