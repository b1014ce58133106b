//! History table: a machine's state trajectory over time
//!
//! A history is a header of column names followed by value rows. Column 0
//! is always the hold duration in milliseconds; the remaining columns are
//! channel values in registration order.
//!
//! ```text
//! header: [runtime(ms), left_drive, right_drive, guard]
//! rows:   [1000, 1.0, -1.0, 0.0]
//!         [500, -1.0, 1.0, 0.75]
//! ```
//!
//! Read this as: hold left at full forward, right at full reverse and the
//! guard down for one second, then reverse both drives and raise the guard
//! to 75% for half a second.
//!
//! Every row must have exactly as many columns as the header. The table
//! enforces this on every append; nothing is ever padded or truncated.

pub mod format;

pub use format::{parse, serialize};

use crate::error::{ReplayError, Result};
use std::time::Duration;

/// Name of the reserved elapsed-time column
pub const TIME_COLUMN: &str = "runtime(ms)";

/// One "hold these values for this long" entry
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    /// How long the values were held, in milliseconds
    pub duration_ms: u64,
    /// Channel values, one per header column after the time column
    pub values: Vec<f64>,
}

impl HistoryRow {
    /// Create a new row
    pub fn new(duration_ms: u64, values: Vec<f64>) -> Self {
        Self {
            duration_ms,
            values,
        }
    }

    /// Number of columns including the time column
    pub fn len(&self) -> usize {
        self.values.len() + 1
    }

    /// A row always has its time column, so it is never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The hold duration
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Header plus ordered value rows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryTable {
    header: Vec<String>,
    rows: Vec<HistoryRow>,
}

impl HistoryTable {
    /// Create a table with no header; every append will fail until one is set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a table with the given header columns
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Create a table for the given channels, prefixed by the time column
    pub fn for_channels<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header = std::iter::once(TIME_COLUMN.to_string())
            .chain(channels.into_iter().map(Into::into))
            .collect();
        Self::new(header)
    }

    /// Append a row, enforcing the header's column count
    pub fn append_row(&mut self, row: HistoryRow) -> Result<()> {
        if row.len() != self.header.len() {
            tracing::error!(
                "History row has {} columns but the header has {}",
                row.len(),
                self.header.len()
            );
            return Err(ReplayError::SchemaMismatch {
                expected: self.header.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// All header columns, including the time column
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Channel columns, excluding the time column
    pub fn channel_names(&self) -> &[String] {
        self.header.get(1..).unwrap_or(&[])
    }

    /// Value rows in order
    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    /// Number of header columns
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Number of value rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no value rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all hold durations
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.rows.iter().map(|r| r.duration_ms).sum())
    }

    /// Column position of a channel
    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Check the table's shape before it is consumed
    ///
    /// Rows were checked on append, but a table that came from a file or
    /// was assembled elsewhere is verified again here.
    pub fn validate(&self) -> Result<()> {
        if self.header.is_empty() {
            return Err(ReplayError::EmptyTable);
        }

        for (i, name) in self.channel_names().iter().enumerate() {
            if self.channel_names()[..i].contains(name) {
                return Err(ReplayError::DuplicateChannel(name.clone()));
            }
        }

        if let Some(row) = self.rows.iter().find(|r| r.len() != self.header.len()) {
            return Err(ReplayError::SchemaMismatch {
                expected: self.header.len(),
                actual: row.len(),
            });
        }

        Ok(())
    }
}
