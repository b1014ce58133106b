//! Channels and execution contexts that log into one shared event trace
//!
//! Used to check the interleaving of writes and holds during playback.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use stateplay_rs::timing::{CancelToken, ExecutionContext, Hold};
use stateplay_rs::{Channel, ChannelKind, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Write(String, f64),
    Hold(Duration),
}

/// Shared, ordered event log
#[derive(Debug, Clone, Default)]
pub struct Trace {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn channel(&self, name: &str, initial: f64) -> TraceChannel {
        TraceChannel {
            name: name.to_string(),
            value: Arc::new(Mutex::new(initial)),
            trace: self.clone(),
        }
    }

    pub fn context(&self) -> TraceContext {
        TraceContext {
            trace: self.clone(),
            token: CancelToken::new(),
            cancel_after: None,
        }
    }
}

pub fn write(name: &str, value: f64) -> Event {
    Event::Write(name.to_string(), value)
}

pub fn hold(ms: u64) -> Event {
    Event::Hold(Duration::from_millis(ms))
}

/// Motor channel that logs every write
#[derive(Debug, Clone)]
pub struct TraceChannel {
    name: String,
    value: Arc<Mutex<f64>>,
    trace: Trace,
}

impl TraceChannel {
    pub fn set(&self, value: f64) {
        *self.value.lock().unwrap() = value;
    }
}

impl Channel for TraceChannel {
    fn read(&self) -> Result<f64> {
        Ok(*self.value.lock().unwrap())
    }

    fn write(&self, value: f64) -> Result<()> {
        self.set(value);
        self.trace.push(Event::Write(self.name.clone(), value));
        Ok(())
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Motor
    }
}

/// Context that logs holds without sleeping
pub struct TraceContext {
    trace: Trace,
    token: CancelToken,
    cancel_after: Option<usize>,
}

impl TraceContext {
    /// Cancel during the n-th hold (zero-based)
    pub fn cancel_during_hold(mut self, n: usize) -> Self {
        self.cancel_after = Some(n);
        self
    }

    fn holds_so_far(&self) -> usize {
        self.trace
            .events()
            .iter()
            .filter(|e| matches!(e, Event::Hold(_)))
            .count()
    }
}

impl ExecutionContext for TraceContext {
    fn sleep(&self, duration: Duration) -> Hold {
        let index = self.holds_so_far();
        self.trace.push(Event::Hold(duration));
        if self.cancel_after == Some(index) {
            self.token.cancel();
        }
        if self.token.is_cancelled() {
            Hold::Cancelled
        } else {
            Hold::Completed
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
