//! Recorder that captures a machine's state trajectory as delta rows

use std::sync::Arc;
use std::time::Duration;

use crate::channel::{ChannelDirectory, Snapshot};
use crate::error::{ReplayError, Result};
use crate::history::{HistoryRow, HistoryTable};
use crate::timing::{Clock, MonotonicClock};

/// Watches every channel of a directory and logs what changed and when
///
/// Call [`Recorder::update`] from the host's control loop whenever the
/// state may have changed. When any channel differs from the last observed
/// state, the recorder appends a row holding the *previous* state for the
/// time it was active, then starts timing the new state.
///
/// The state active when [`Recorder::finish`] is called has no closing
/// change, so it is not part of the returned table.
pub struct Recorder<'d> {
    /// Channels being watched
    channels: &'d ChannelDirectory,
    /// Time source for hold durations
    clock: Arc<dyn Clock>,
    /// Accumulated history
    table: HistoryTable,
    /// State observed at the last change
    previous: Snapshot,
    /// Baseline captured when the channels were registered
    initial: Snapshot,
    /// Clock reading at the last emitted row (or at start)
    mark: Duration,
    /// Minimum difference that counts as a change (0.0 = exact)
    tolerance: f64,
}

impl std::fmt::Debug for Recorder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("rows", &self.table.row_count())
            .field("previous", &self.previous)
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl<'d> Recorder<'d> {
    /// Start recording with a real-time clock
    pub fn start(channels: &'d ChannelDirectory) -> Result<Self> {
        Self::start_with_clock(channels, Arc::new(MonotonicClock::new()))
    }

    /// Start recording with the given clock
    pub fn start_with_clock(channels: &'d ChannelDirectory, clock: Arc<dyn Clock>) -> Result<Self> {
        if channels.is_empty() {
            tracing::error!("Could not start recording: the machine has no channels");
            return Err(ReplayError::EmptyChannelSet);
        }

        tracing::info!("Recording {} channels", channels.len());

        let table = HistoryTable::for_channels(channels.names());
        let previous = channels.snapshot()?;
        let mark = clock.now();

        Ok(Self {
            channels,
            clock,
            table,
            previous,
            initial: channels.baseline().clone(),
            mark,
            tolerance: 0.0,
        })
    }

    /// Ignore changes no larger than `tolerance`
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    /// Sample every channel and append a row if the state changed
    ///
    /// Returns whether a row was appended. On a read failure nothing is
    /// recorded and the error is returned to the caller.
    pub fn update(&mut self) -> Result<bool> {
        let current = self.channels.snapshot()?;

        if !self.state_changed(&current) {
            tracing::trace!(
                "Same state found, skipping ({} rows)",
                self.table.row_count()
            );
            return Ok(false);
        }

        let now = self.clock.now();
        self.emit_previous(now)?;
        self.previous = current;
        Ok(true)
    }

    /// Stop recording and return the history
    ///
    /// The state that was active when this is called is dropped; see
    /// [`Recorder::finish_with_flush`] to keep it.
    pub fn finish(self) -> HistoryTable {
        tracing::info!(
            "Recording finished with {} rows ({} ms)",
            self.table.row_count(),
            self.table.total_duration().as_millis()
        );
        self.table
    }

    /// Stop recording, closing the active state with its elapsed time
    pub fn finish_with_flush(mut self) -> Result<HistoryTable> {
        self.update()?;
        let now = self.clock.now();
        self.emit_previous(now)?;
        Ok(self.finish())
    }

    /// The history recorded so far
    pub fn table(&self) -> &HistoryTable {
        &self.table
    }

    /// Number of rows recorded so far
    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Baseline to restore after playing this recording back
    pub fn initial_values(&self) -> &Snapshot {
        &self.initial
    }

    /// Time the current state has been held
    pub fn elapsed_since_change(&self) -> Duration {
        self.clock.now().saturating_sub(self.mark)
    }

    fn state_changed(&self, current: &Snapshot) -> bool {
        self.previous
            .iter()
            .zip(current.iter())
            .any(|((name, prev), (_, cur))| {
                let changed = if self.tolerance > 0.0 {
                    (cur - prev).abs() > self.tolerance
                } else {
                    cur != prev
                };
                if changed {
                    tracing::debug!("{} changed from {} to {}", name, prev, cur);
                }
                changed
            })
    }

    fn emit_previous(&mut self, now: Duration) -> Result<()> {
        let elapsed = now.saturating_sub(self.mark).as_millis() as u64;
        self.table
            .append_row(HistoryRow::new(elapsed, self.previous.values()))?;
        self.mark = now;

        tracing::debug!(
            "Recorded row {}: held for {} ms",
            self.table.row_count(),
            elapsed
        );
        Ok(())
    }
}
