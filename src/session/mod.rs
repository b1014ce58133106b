//! Recording and playback sessions
//!
//! A recording session watches a [`ChannelDirectory`](crate::channel::ChannelDirectory)
//! and turns its state changes into a [`HistoryTable`](crate::history::HistoryTable).
//! A playback session writes that table back onto the channels with the
//! recorded timing, then restores the baseline.
//!
//! # Features
//!
//! - Delta-encoded capture: one row per state change, holding the previous
//!   state for the time it was active
//! - Optional change tolerance and end-of-session flush
//! - Cancellable playback that always ends with a baseline restore
//! - On/off controller for hosts that poll from a control loop

pub mod controller;
pub mod player;
pub mod recorder;
pub mod types;

pub use controller::RecordingController;
pub use player::Player;
pub use recorder::Recorder;
pub use types::{HistorySummary, PlaybackReport, PlaybackState};
