//! Session data types

use serde::Serialize;
use std::time::Duration;

use crate::history::HistoryTable;

/// State of a playback run
///
/// ```text
/// Idle -> Validating -> Running(row) -> Restoring -> Done
///              |             |              |
///              +-------------+--------------+--> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No playback has run yet
    #[default]
    Idle,
    /// Checking the table's shape
    Validating,
    /// Applying a row or holding its values
    Running { row: usize },
    /// Writing the baseline back to every channel
    Restoring,
    /// Every row played and the baseline was restored
    Done,
    /// Stopped early by cancellation or an error
    Aborted,
}

impl PlaybackState {
    /// Check if playback has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Done | PlaybackState::Aborted)
    }

    /// Check if rows are being played
    pub fn is_running(&self) -> bool {
        matches!(self, PlaybackState::Running { .. })
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Validating => "Validating",
            PlaybackState::Running { .. } => "Running",
            PlaybackState::Restoring => "Restoring",
            PlaybackState::Done => "Done",
            PlaybackState::Aborted => "Aborted",
        }
    }
}

/// What a successful playback did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackReport {
    /// Rows whose values were written
    pub rows_applied: usize,
    /// Rows in the table
    pub rows_total: usize,
    /// Sum of the hold durations that were requested
    pub requested_hold: Duration,
    /// Wall time spent in playback, including restoration
    pub elapsed: Duration,
}

/// Overview of a history table, for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    /// Channel columns, without the time column
    pub channels: Vec<String>,
    /// Number of value rows
    pub rows: usize,
    /// Sum of all hold durations in milliseconds
    pub total_duration_ms: u64,
    /// Longest single hold in milliseconds
    pub longest_hold_ms: u64,
}

impl From<&HistoryTable> for HistorySummary {
    fn from(table: &HistoryTable) -> Self {
        Self {
            channels: table.channel_names().to_vec(),
            rows: table.row_count(),
            total_duration_ms: table.total_duration().as_millis() as u64,
            longest_hold_ms: table
                .rows()
                .iter()
                .map(|r| r.duration_ms)
                .max()
                .unwrap_or(0),
        }
    }
}
