//! Channel capability interface and the named channel directory
//!
//! A channel is one controllable scalar on the device: a motor's power, a
//! servo's position. Every device kind exposes the same tiny capability
//! set through the [`Channel`] trait, so the recorder and player never
//! branch on what kind of hardware sits behind a name.
//!
//! The [`ChannelDirectory`] owns the channel handles. Channels are resolved
//! by name once, at registration time, and the value each channel holds at
//! that moment becomes the directory's baseline [`Snapshot`]. Playback
//! restores that baseline when it finishes or aborts.
//!
//! # Example
//!
//! ```ignore
//! use stateplay_rs::channel::{ChannelDirectory, sim::SimulatedChannel};
//!
//! let mut directory = ChannelDirectory::new();
//! directory.register("left_drive", SimulatedChannel::motor(0.0))?;
//! directory.register("pusher", SimulatedChannel::servo(0.5))?;
//!
//! let value = directory.get("pusher")?.read()?;
//! ```

pub mod sim;

use crate::error::{ReplayError, Result};
use crate::history::{HistoryRow, TIME_COLUMN};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kind of actuator behind a channel
///
/// Both kinds expose a single normalized scalar; they differ only in the
/// range the scalar is allowed to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChannelKind {
    /// Drive motor power, normalized to [-1.0, 1.0]
    #[default]
    Motor,
    /// Servo position, normalized to [0.0, 1.0]
    Servo,
}

impl ChannelKind {
    /// Inclusive normalized range for this kind
    pub fn range(&self) -> (f64, f64) {
        match self {
            ChannelKind::Motor => (-1.0, 1.0),
            ChannelKind::Servo => (0.0, 1.0),
        }
    }

    /// Clamp a value into this kind's range
    pub fn clamp(&self, value: f64) -> f64 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Motor => write!(f, "motor"),
            ChannelKind::Servo => write!(f, "servo"),
        }
    }
}

/// Read/write access to one normalized scalar on a device
///
/// Implementations must be `Send + Sync`: the operator loop drives channels
/// through a shared directory while the recorder samples them, so access
/// goes through `&self` and implementations use interior mutability.
#[cfg_attr(test, mockall::automock)]
pub trait Channel: Send + Sync {
    /// Read the channel's current value
    fn read(&self) -> Result<f64>;

    /// Command a new value
    fn write(&self, value: f64) -> Result<()>;

    /// The kind of actuator behind this channel
    fn kind(&self) -> ChannelKind;
}

/// The value of every channel at one instant, in registration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    entries: Vec<(String, f64)>,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a channel value
    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.entries.push((name.into(), value));
    }

    /// Value recorded for a channel
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Iterate over (name, value) pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Channel values in order, without names
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    /// Number of channels in the snapshot
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The snapshot as a zero-duration history row
    pub fn to_row(&self) -> HistoryRow {
        HistoryRow::new(0, self.values())
    }
}

/// Validate a name so it survives the bracketed, comma-separated format
pub fn validate_channel_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| ReplayError::InvalidChannelName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.trim() != name {
        return Err(invalid("name has surrounding whitespace"));
    }
    if name.contains([',', '[', ']', '\n', '\r']) {
        return Err(invalid("name contains a comma, bracket or line break"));
    }
    if name == TIME_COLUMN {
        return Err(invalid("name is reserved for the time column"));
    }
    Ok(())
}

/// Named directory of channels, in registration order
///
/// Registration reads each channel once and keeps the value as part of the
/// baseline snapshot.
#[derive(Default)]
pub struct ChannelDirectory {
    channels: Vec<(String, Box<dyn Channel>)>,
    index: HashMap<String, usize>,
    baseline: Snapshot,
}

impl fmt::Debug for ChannelDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelDirectory")
            .field("names", &self.names().collect::<Vec<_>>())
            .field("baseline", &self.baseline)
            .finish()
    }
}

impl ChannelDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel under a unique name
    pub fn register(&mut self, name: impl Into<String>, channel: impl Channel + 'static) -> Result<()> {
        self.register_boxed(name, Box::new(channel))
    }

    /// Register an already boxed channel under a unique name
    pub fn register_boxed(&mut self, name: impl Into<String>, channel: Box<dyn Channel>) -> Result<()> {
        let name = name.into();
        validate_channel_name(&name)?;

        if self.index.contains_key(&name) {
            return Err(ReplayError::DuplicateChannel(name));
        }

        let initial = channel
            .read()
            .map_err(|e| ReplayError::read_failed(&name, e))?;

        tracing::debug!(
            "Registered {} channel {} (baseline {})",
            channel.kind(),
            name,
            initial
        );

        self.index.insert(name.clone(), self.channels.len());
        self.baseline.push(name.clone(), initial);
        self.channels.push((name, channel));
        Ok(())
    }

    /// Channel names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|(n, _)| n.as_str())
    }

    /// Look up a channel by name
    pub fn get(&self, name: &str) -> Result<&dyn Channel> {
        self.index
            .get(name)
            .map(|&i| self.channels[i].1.as_ref())
            .ok_or_else(|| ReplayError::UnknownChannel(name.to_string()))
    }

    /// Check whether a channel is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of registered channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if no channels are registered
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Values captured when each channel was registered
    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }

    /// Read every channel now
    pub fn snapshot(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new();
        for (name, channel) in &self.channels {
            let value = channel
                .read()
                .map_err(|e| ReplayError::read_failed(name, e))?;
            snapshot.push(name.clone(), value);
        }
        Ok(snapshot)
    }

    /// Write every value of a snapshot to its channel
    ///
    /// Keeps going past failed or unknown channels so as many channels as
    /// possible reach the requested state; the first failure is returned.
    pub fn apply(&self, snapshot: &Snapshot) -> Result<()> {
        let mut first_error = None;

        for (name, value) in snapshot.iter() {
            let result = self.get(name).and_then(|channel| {
                channel
                    .write(value)
                    .map_err(|e| ReplayError::write_failed(name, e))
            });

            if let Err(e) = result {
                tracing::error!("Failed to apply {} = {}: {}", name, value, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::sim::SimulatedChannel;
    use super::*;

    #[test]
    fn test_kind_clamp() {
        assert_eq!(ChannelKind::Motor.clamp(1.5), 1.0);
        assert_eq!(ChannelKind::Motor.clamp(-3.0), -1.0);
        assert_eq!(ChannelKind::Servo.clamp(-0.2), 0.0);
        assert_eq!(ChannelKind::Servo.clamp(0.25), 0.25);
    }

    #[test]
    fn test_register_captures_baseline_in_order() {
        let mut directory = ChannelDirectory::new();
        directory
            .register("left", SimulatedChannel::motor(0.1))
            .unwrap();
        directory
            .register("guard", SimulatedChannel::servo(0.75))
            .unwrap();

        assert_eq!(directory.names().collect::<Vec<_>>(), vec!["left", "guard"]);
        assert_eq!(directory.baseline().values(), vec![0.1, 0.75]);
        assert_eq!(directory.baseline().to_row().duration_ms, 0);
    }

    #[test]
    fn test_register_rejects_bad_names() {
        let mut directory = ChannelDirectory::new();
        for bad in ["", " left", "a,b", "[x]", TIME_COLUMN] {
            let err = directory
                .register(bad, SimulatedChannel::motor(0.0))
                .unwrap_err();
            assert!(matches!(err, ReplayError::InvalidChannelName { .. }), "{bad:?}");
        }
        assert!(directory.is_empty());
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut directory = ChannelDirectory::new();
        directory.register("m", SimulatedChannel::motor(0.0)).unwrap();
        let err = directory
            .register("m", SimulatedChannel::motor(0.0))
            .unwrap_err();
        assert!(matches!(err, ReplayError::DuplicateChannel(name) if name == "m"));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_register_propagates_read_failure() {
        let mut mock = MockChannel::new();
        mock.expect_read()
            .returning(|| Err(ReplayError::Config("bus offline".to_string())));
        mock.expect_kind().return_const(ChannelKind::Motor);

        let mut directory = ChannelDirectory::new();
        let err = directory.register("arm", mock).unwrap_err();
        assert!(matches!(err, ReplayError::ChannelReadFailed { name, .. } if name == "arm"));
    }

    #[test]
    fn test_get_unknown_channel() {
        let directory = ChannelDirectory::new();
        assert!(matches!(
            directory.get("nope"),
            Err(ReplayError::UnknownChannel(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_apply_continues_past_failures() {
        let broken = SimulatedChannel::motor(0.0);
        let healthy = SimulatedChannel::servo(0.0);

        let mut directory = ChannelDirectory::new();
        directory.register("broken", broken.clone()).unwrap();
        directory.register("healthy", healthy.clone()).unwrap();
        broken.fail_writes(true);

        let mut target = Snapshot::new();
        target.push("broken", 0.5);
        target.push("healthy", 0.5);

        let err = directory.apply(&target).unwrap_err();
        assert!(matches!(err, ReplayError::ChannelWriteFailed { name, .. } if name == "broken"));
        assert_eq!(healthy.value(), 0.5);
    }
}
