//! On/off recording control for a host control loop

use std::path::PathBuf;
use std::sync::Arc;

use crate::channel::ChannelDirectory;
use crate::error::{ReplayError, Result};
use crate::history::HistoryTable;
use crate::storage::HistoryStore;
use crate::timing::{Clock, MonotonicClock};

use super::recorder::Recorder;

/// Starts, feeds and stops recording sessions over one channel directory
///
/// The host calls [`RecordingController::update_recording`] every loop
/// iteration regardless of whether a recording is active; calls outside a
/// session are ignored.
pub struct RecordingController<'d> {
    channels: &'d ChannelDirectory,
    clock: Arc<dyn Clock>,
    tolerance: f64,
    active: Option<Recorder<'d>>,
    last_recording: Option<HistoryTable>,
}

impl<'d> RecordingController<'d> {
    /// Create a controller with a real-time clock
    pub fn new(channels: &'d ChannelDirectory) -> Self {
        Self::with_clock(channels, Arc::new(MonotonicClock::new()))
    }

    /// Create a controller with the given clock
    pub fn with_clock(channels: &'d ChannelDirectory, clock: Arc<dyn Clock>) -> Self {
        Self {
            channels,
            clock,
            tolerance: 0.0,
            active: None,
            last_recording: None,
        }
    }

    /// Change tolerance applied to sessions started afterwards
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Check if a session is open
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Open a new recording session
    pub fn start_recording(&mut self) -> Result<()> {
        if self.active.is_some() {
            tracing::warn!("Recording already in progress");
            return Err(ReplayError::SessionActive);
        }

        let recorder = Recorder::start_with_clock(self.channels, Arc::clone(&self.clock))?
            .with_tolerance(self.tolerance);
        self.active = Some(recorder);
        Ok(())
    }

    /// Sample the channels if a session is open
    pub fn update_recording(&mut self) -> Result<bool> {
        match self.active.as_mut() {
            Some(recorder) => recorder.update(),
            None => {
                tracing::warn!("update_recording called while not recording");
                Ok(false)
            }
        }
    }

    /// Close the session and persist it
    ///
    /// Returns the saved file's path, or `None` if nothing was recording or
    /// the write failed. The table stays available through
    /// [`RecordingController::last_recording`] either way.
    pub fn stop_recording(&mut self, store: &HistoryStore) -> Option<PathBuf> {
        let Some(recorder) = self.active.take() else {
            tracing::warn!("stop_recording called while not recording");
            return None;
        };

        let table = recorder.finish();
        let path = store.write_history(&table);
        self.last_recording = Some(table);
        path
    }

    /// Table produced by the most recent session
    pub fn last_recording(&self) -> Option<&HistoryTable> {
        self.last_recording.as_ref()
    }
}
