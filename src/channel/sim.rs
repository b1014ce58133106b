//! Simulated channels for testing and demos
//!
//! [`SimulatedChannel`] stands in for a motor or servo without real
//! hardware. Handles are cheap to clone and share state, so a test can keep
//! one handle while the directory owns another.
//!
//! # Features
//!
//! - **Kind-based clamping**: motors clamp to [-1, 1], servos to [0, 1]
//! - **Write log**: every value commanded through [`Channel::write`]
//! - **Operator input**: [`SimulatedChannel::set`] changes the value
//!   without touching the write log, like a driver moving a joystick
//! - **Failure injection**: reads and writes can be made to fail

use crate::error::{ReplayError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{Channel, ChannelKind};

#[derive(Debug)]
struct SimState {
    kind: ChannelKind,
    value: Mutex<f64>,
    writes: Mutex<Vec<f64>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

/// In-memory actuator implementing [`Channel`]
#[derive(Debug, Clone)]
pub struct SimulatedChannel {
    state: Arc<SimState>,
}

impl SimulatedChannel {
    /// Create a simulated channel of the given kind
    pub fn new(kind: ChannelKind, initial: f64) -> Self {
        Self {
            state: Arc::new(SimState {
                kind,
                value: Mutex::new(kind.clamp(initial)),
                writes: Mutex::new(Vec::new()),
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
            }),
        }
    }

    /// Create a simulated drive motor
    pub fn motor(initial: f64) -> Self {
        Self::new(ChannelKind::Motor, initial)
    }

    /// Create a simulated servo
    pub fn servo(initial: f64) -> Self {
        Self::new(ChannelKind::Servo, initial)
    }

    /// Current value
    pub fn value(&self) -> f64 {
        *self.state.value.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Change the value as operator input would, without logging a write
    pub fn set(&self, value: f64) {
        let clamped = self.state.kind.clamp(value);
        *self.state.value.lock().unwrap_or_else(|e| e.into_inner()) = clamped;
    }

    /// Values commanded through [`Channel::write`], oldest first
    pub fn writes(&self) -> Vec<f64> {
        self.state
            .writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Forget the write log
    pub fn clear_writes(&self) {
        self.state
            .writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Make subsequent reads fail
    pub fn fail_reads(&self, fail: bool) {
        self.state.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail
    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl Channel for SimulatedChannel {
    fn read(&self) -> Result<f64> {
        if self.state.fail_reads.load(Ordering::SeqCst) {
            return Err(ReplayError::Config("simulated read fault".to_string()));
        }
        Ok(self.value())
    }

    fn write(&self, value: f64) -> Result<()> {
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(ReplayError::Config("simulated write fault".to_string()));
        }
        self.set(value);
        self.state
            .writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(value);
        Ok(())
    }

    fn kind(&self) -> ChannelKind {
        self.state.kind
    }
}
