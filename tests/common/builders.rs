//! Test data builders for machines and history tables

use stateplay_rs::channel::sim::SimulatedChannel;
use stateplay_rs::{ChannelDirectory, ChannelKind, HistoryRow, HistoryTable};

/// Builder for a directory of simulated channels
///
/// Keeps a handle to every channel so tests can play operator or inspect
/// what playback wrote.
pub struct MachineBuilder {
    channels: Vec<(String, SimulatedChannel)>,
}

impl MachineBuilder {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    pub fn motor(mut self, name: &str, initial: f64) -> Self {
        self.channels
            .push((name.to_string(), SimulatedChannel::new(ChannelKind::Motor, initial)));
        self
    }

    pub fn servo(mut self, name: &str, initial: f64) -> Self {
        self.channels
            .push((name.to_string(), SimulatedChannel::new(ChannelKind::Servo, initial)));
        self
    }

    pub fn build(self) -> Machine {
        let mut directory = ChannelDirectory::new();
        for (name, channel) in &self.channels {
            directory
                .register(name.as_str(), channel.clone())
                .expect("test channel names are valid");
        }
        Machine {
            directory,
            handles: self.channels,
        }
    }
}

/// A built directory plus handles to its channels
pub struct Machine {
    pub directory: ChannelDirectory,
    handles: Vec<(String, SimulatedChannel)>,
}

impl Machine {
    pub fn channel(&self, name: &str) -> &SimulatedChannel {
        self.handles
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .unwrap_or_else(|| panic!("no test channel {}", name))
    }

    pub fn values(&self) -> Vec<f64> {
        self.handles.iter().map(|(_, c)| c.value()).collect()
    }
}

/// Builder for history tables
pub struct TableBuilder {
    table: HistoryTable,
}

impl TableBuilder {
    pub fn new(channels: &[&str]) -> Self {
        Self {
            table: HistoryTable::for_channels(channels.iter().copied()),
        }
    }

    pub fn row(mut self, duration_ms: u64, values: &[f64]) -> Self {
        self.table
            .append_row(HistoryRow::new(duration_ms, values.to_vec()))
            .expect("test rows match the header");
        self
    }

    pub fn build(self) -> HistoryTable {
        self.table
    }
}

