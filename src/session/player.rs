//! Player that replays a history table onto live channels

use std::time::{Duration, Instant};

use crate::channel::{Channel, ChannelDirectory, Snapshot};
use crate::error::{ReplayError, Result};
use crate::history::HistoryTable;
use crate::timing::{ExecutionContext, Hold};

use super::types::{PlaybackReport, PlaybackState};

/// Replays recorded rows, then puts the machine back in its baseline state
///
/// Each row's values are written together and then held for the row's
/// duration. Whether playback finishes, is cancelled or fails part way, the
/// baseline snapshot is written back before [`Player::play`] returns. The
/// only exception is a table that fails validation, since nothing has been
/// written yet.
#[derive(Debug, Default)]
pub struct Player {
    /// Where the last (or current) playback got to
    state: PlaybackState,
    /// Snapshot to restore instead of the directory's baseline
    baseline: Option<Snapshot>,
}

impl Player {
    /// Create a player that restores the directory's registration baseline
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore this snapshot instead of the directory's baseline
    pub fn with_baseline(mut self, baseline: Snapshot) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Play every row of `table` onto `channels`
    ///
    /// Blocks on `ctx` for each row's hold. Returns
    /// [`ReplayError::Aborted`] if `ctx` is cancelled, after the baseline
    /// has been restored.
    pub fn play(
        &mut self,
        table: &HistoryTable,
        channels: &ChannelDirectory,
        ctx: &dyn ExecutionContext,
    ) -> Result<PlaybackReport> {
        let started = Instant::now();
        self.state = PlaybackState::Validating;

        if let Err(e) = table.validate() {
            tracing::error!("Refusing to play history: {}", e);
            self.state = PlaybackState::Aborted;
            return Err(e);
        }

        if ctx.is_cancelled() {
            tracing::info!("Playback cancelled before the first row");
            self.state = PlaybackState::Aborted;
            return Err(ReplayError::Aborted { rows_applied: 0 });
        }

        tracing::info!(
            "Playing {} rows over {} channels ({} ms)",
            table.row_count(),
            table.channel_names().len(),
            table.total_duration().as_millis()
        );

        let mut report = PlaybackReport {
            rows_applied: 0,
            rows_total: table.row_count(),
            requested_hold: Duration::ZERO,
            elapsed: Duration::ZERO,
        };

        let outcome = self.run_rows(table, channels, ctx, &mut report);

        self.state = PlaybackState::Restoring;
        let baseline = self.baseline.as_ref().unwrap_or_else(|| channels.baseline());
        tracing::debug!("Restoring baseline for {} channels", baseline.len());
        let restored = channels.apply(baseline);

        report.elapsed = started.elapsed();

        match (outcome, restored) {
            (Ok(()), Ok(())) => {
                self.state = PlaybackState::Done;
                tracing::info!(
                    "Playback done: {} rows in {:?}",
                    report.rows_applied,
                    report.elapsed
                );
                Ok(report)
            }
            (Ok(()), Err(restore_err)) => {
                self.state = PlaybackState::Aborted;
                tracing::error!("Playback finished but restoring failed: {}", restore_err);
                Err(restore_err)
            }
            (Err(e), restored) => {
                self.state = PlaybackState::Aborted;
                if let Err(restore_err) = restored {
                    tracing::error!("Restoring after a failed playback also failed: {}", restore_err);
                }
                if e.is_aborted() {
                    tracing::warn!("Playback aborted after {} rows", report.rows_applied);
                } else {
                    tracing::error!("Playback failed after {} rows: {}", report.rows_applied, e);
                }
                Err(e)
            }
        }
    }

    fn run_rows(
        &mut self,
        table: &HistoryTable,
        channels: &ChannelDirectory,
        ctx: &dyn ExecutionContext,
        report: &mut PlaybackReport,
    ) -> Result<()> {
        self.state = PlaybackState::Running { row: 0 };

        // Every column is resolved before the first write, so a missing
        // channel never leaves a row half applied
        let targets = table
            .channel_names()
            .iter()
            .map(|name| channels.get(name).map(|channel| (name.as_str(), channel)))
            .collect::<Result<Vec<(&str, &dyn Channel)>>>()?;

        for (index, row) in table.rows().iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(ReplayError::Aborted {
                    rows_applied: report.rows_applied,
                });
            }
            self.state = PlaybackState::Running { row: index };

            for ((name, channel), &value) in targets.iter().zip(&row.values) {
                channel
                    .write(value)
                    .map_err(|e| ReplayError::write_failed(*name, e))?;
            }
            report.rows_applied = index + 1;
            report.requested_hold += row.duration();

            tracing::trace!("Row {} applied, holding {} ms", index, row.duration_ms);

            if ctx.sleep(row.duration()) == Hold::Cancelled {
                return Err(ReplayError::Aborted {
                    rows_applied: report.rows_applied,
                });
            }
        }

        Ok(())
    }
}
