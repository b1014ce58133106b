//! Error handling for stateplay-rs
//!
//! This module defines the error taxonomy shared by the recorder, the
//! history format and the player, plus a Result alias for use throughout
//! the crate.
//!
//! # Categories
//!
//! - **Schema errors**: the shape of a table or directory is wrong
//!   ([`ReplayError::EmptyChannelSet`], [`ReplayError::SchemaMismatch`],
//!   [`ReplayError::EmptyTable`], [`ReplayError::UnknownChannel`], ...)
//! - **Parse errors**: a history file could not be loaded
//!   ([`ReplayError::MalformedHeader`], [`ReplayError::MalformedRow`])
//! - **Device errors**: a channel refused a read or write
//! - **Cancellation**: playback was aborted by the caller
//! - **I/O and configuration errors**

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for stateplay-rs operations
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Recording was started against a directory with no channels
    #[error("Cannot record: the channel directory is empty")]
    EmptyChannelSet,

    /// A row's column count differs from the header's
    #[error("Schema mismatch: expected {expected} columns, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// A table without any header columns was handed to the player
    #[error("History table has no header columns")]
    EmptyTable,

    /// A table column names a channel the live directory does not have
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// A channel name appears twice in a directory or header
    #[error("Duplicate channel: {0}")]
    DuplicateChannel(String),

    /// A channel name cannot be represented in the history format
    #[error("Invalid channel name {name:?}: {reason}")]
    InvalidChannelName { name: String, reason: String },

    /// The first line of a history file is not a valid header
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// A value line of a history file could not be parsed
    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    /// Reading a channel's current value failed
    #[error("Failed to read channel {name}: {message}")]
    ChannelReadFailed { name: String, message: String },

    /// Writing a value to a channel failed
    #[error("Failed to write channel {name}: {message}")]
    ChannelWriteFailed { name: String, message: String },

    /// Playback was cancelled before it completed
    #[error("Playback aborted after {rows_applied} rows")]
    Aborted { rows_applied: usize },

    /// A recording was started while another one is still open
    #[error("A recording session is already active")]
    SessionActive,

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// A history file could not be read or written
    #[error("Storage error at {path:?}: {message}")]
    Storage { path: PathBuf, message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ReplayError>,
    },
}

impl ReplayError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ReplayError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a read failure for the named channel
    pub fn read_failed(name: impl Into<String>, message: impl ToString) -> Self {
        ReplayError::ChannelReadFailed {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Create a write failure for the named channel
    pub fn write_failed(name: impl Into<String>, message: impl ToString) -> Self {
        ReplayError::ChannelWriteFailed {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// The innermost error, with any context layers removed
    pub fn root(&self) -> &ReplayError {
        match self {
            ReplayError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error (ignoring context) is a cancellation
    pub fn is_aborted(&self) -> bool {
        matches!(self.root(), ReplayError::Aborted { .. })
    }
}

/// Result type alias for stateplay-rs operations
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReplayError::UnknownChannel("arm".to_string());
        assert_eq!(err.to_string(), "Unknown channel: arm");

        let err = ReplayError::SchemaMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Schema mismatch: expected 3 columns, got 2");
    }

    #[test]
    fn test_error_with_context() {
        let err = ReplayError::EmptyTable;
        let with_ctx = err.with_context("Failed to play history");
        assert!(with_ctx.to_string().contains("Failed to play history"));
        assert!(matches!(with_ctx.root(), ReplayError::EmptyTable));
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let err = ReplayError::MalformedRow {
            line: 4,
            reason: "not a number".to_string(),
        };
        assert!(err.to_string().contains("line 4"));
    }

    #[test]
    fn test_is_aborted_through_context() {
        let err = ReplayError::Aborted { rows_applied: 2 }.with_context("playback");
        assert!(err.is_aborted());
        assert!(!ReplayError::EmptyTable.is_aborted());
    }
}
