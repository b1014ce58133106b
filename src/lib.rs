//! # stateplay-rs: actuator state recording and timed replay
//!
//! Lets an operator drive a machine by hand while every actuator change is
//! logged, then replays that exact sequence of states and hold times
//! without operator input.
//!
//! ## Architecture
//!
//! - **Channels**: named scalar actuators behind the [`channel::Channel`] trait,
//!   owned by a [`channel::ChannelDirectory`]
//! - **Recorder**: samples the directory from the host's control loop and
//!   appends a row whenever the state changes
//! - **History**: the [`history::HistoryTable`] data model and its
//!   line-oriented text format
//! - **Player**: writes each row, holds it for the recorded duration and
//!   restores the baseline at the end, honoring cancellation
//! - **Storage**: timestamped history files in a directory
//!
//! Data flows `ChannelDirectory -> Recorder -> HistoryTable -> text file`
//! and back `text file -> HistoryTable -> Player -> ChannelDirectory`.
//!
//! ## Example
//!
//! ```ignore
//! use stateplay_rs::{
//!     channel::{sim::SimulatedChannel, ChannelDirectory},
//!     session::{Player, Recorder},
//!     timing::{CancelToken, ThreadContext},
//! };
//!
//! let left = SimulatedChannel::motor(0.0);
//! let mut directory = ChannelDirectory::new();
//! directory.register("left_drive", left.clone())?;
//!
//! let mut recorder = Recorder::start(&directory)?;
//! left.set(0.5);
//! recorder.update()?;
//! let table = recorder.finish();
//!
//! let ctx = ThreadContext::new(CancelToken::new());
//! Player::new().play(&table, &directory, &ctx)?;
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod session;
pub mod storage;
pub mod timing;

// Re-export commonly used types
pub use channel::{Channel, ChannelDirectory, ChannelKind, Snapshot};
pub use config::AppConfig;
pub use error::{ReplayError, Result};
pub use history::{HistoryRow, HistoryTable};
pub use session::{Player, PlaybackReport, PlaybackState, Recorder, RecordingController};
pub use storage::HistoryStore;
pub use timing::{CancelToken, ExecutionContext, ThreadContext};
