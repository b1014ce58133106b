//! Clocks, cancellation and the suspension points used by playback
//!
//! The recorder measures hold durations through a [`Clock`], and the player
//! waits out each hold through an [`ExecutionContext`]. Both have a real
//! implementation and a manual one, so tests can drive time by hand.
//!
//! # Cancellation
//!
//! A [`CancelToken`] can be cloned onto another thread (an operator input
//! loop, a watchdog) and triggered from there. A hold that is waiting on the
//! token wakes up immediately instead of sleeping out its full duration.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ==================== Clocks ====================

/// Monotonic time source
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;
}

/// Clock backed by [`Instant`]
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle while the
/// recorder owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, at: Duration) {
        self.millis.store(at.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

// ==================== Cancellation ====================

/// Outcome of a hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hold {
    /// The full duration elapsed
    Completed,
    /// Cancellation was requested before the duration elapsed
    Cancelled,
}

#[derive(Debug)]
struct CancelInner {
    cancelled: AtomicBool,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

/// Cooperative cancellation signal shared between threads
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Create a token that has not been cancelled
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                wake_tx,
                wake_rx,
            }),
        }
    }

    /// Request cancellation and wake any waiting hold
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            let _ = self.inner.wake_tx.try_send(());
        }
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Block for up to `duration`, returning early on cancellation
    pub fn wait(&self, duration: Duration) -> Hold {
        if self.is_cancelled() {
            return Hold::Cancelled;
        }

        match self.inner.wake_rx.recv_timeout(duration) {
            Ok(()) => Hold::Cancelled,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                if self.is_cancelled() {
                    Hold::Cancelled
                } else {
                    Hold::Completed
                }
            }
        }
    }
}

// ==================== Execution Contexts ====================

/// Where the player suspends between rows
pub trait ExecutionContext {
    /// Wait out a hold, honoring cancellation
    fn sleep(&self, duration: Duration) -> Hold;

    /// Check if the caller asked to stop
    fn is_cancelled(&self) -> bool;
}

/// Execution context that blocks the calling thread
#[derive(Debug, Clone)]
pub struct ThreadContext {
    token: CancelToken,
    speed: f64,
}

impl ThreadContext {
    /// Create a real-time context driven by `token`
    pub fn new(token: CancelToken) -> Self {
        Self { token, speed: 1.0 }
    }

    /// Play holds faster (> 1.0) or slower (< 1.0) than recorded
    ///
    /// Clamped to [0.1, 10.0]; NaN falls back to real time.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = if speed.is_nan() {
            tracing::warn!("Playback speed is NaN, using 1.0");
            1.0
        } else {
            speed.clamp(0.1, 10.0)
        };
        self
    }

    /// Playback speed multiplier
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The token this context waits on
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl ExecutionContext for ThreadContext {
    fn sleep(&self, duration: Duration) -> Hold {
        let scaled = Duration::try_from_secs_f64(duration.as_secs_f64() / self.speed)
            .unwrap_or(duration);
        self.token.wait(scaled)
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Execution context that records holds instead of sleeping
///
/// Optionally advances a [`ManualClock`] by each hold, and can simulate an
/// operator abort during a chosen hold.
#[derive(Debug, Default)]
pub struct ManualContext {
    token: CancelToken,
    holds: Mutex<Vec<Duration>>,
    cancel_at: Option<usize>,
    clock: Option<ManualClock>,
}

impl ManualContext {
    /// Create a context that never cancels on its own
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel during the hold with this zero-based index
    pub fn cancel_at_hold(mut self, index: usize) -> Self {
        self.cancel_at = Some(index);
        self
    }

    /// Advance `clock` by every completed hold
    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// The token backing this context
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Every hold requested so far, in order
    pub fn holds(&self) -> Vec<Duration> {
        self.holds.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ExecutionContext for ManualContext {
    fn sleep(&self, duration: Duration) -> Hold {
        let index = {
            let mut holds = self.holds.lock().unwrap_or_else(|e| e.into_inner());
            holds.push(duration);
            holds.len() - 1
        };

        if self.cancel_at == Some(index) {
            self.token.cancel();
        }
        if self.token.is_cancelled() {
            return Hold::Cancelled;
        }

        if let Some(clock) = &self.clock {
            clock.advance(duration);
        }
        Hold::Completed
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
        handle.set(Duration::from_millis(10));
        assert_eq!(clock.now(), Duration::from_millis(10));
    }

    #[test]
    fn test_monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.now() > a);
    }

    #[test]
    fn test_token_wait_completes() {
        let token = CancelToken::new();
        assert_eq!(token.wait(Duration::from_millis(5)), Hold::Completed);
        assert_eq!(token.wait(Duration::ZERO), Hold::Completed);
    }

    #[test]
    fn test_token_cancel_wakes_waiter() {
        let token = CancelToken::new();
        let remote = token.clone();

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        let start = Instant::now();
        assert_eq!(token.wait(Duration::from_secs(10)), Hold::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(5));
        canceller.join().unwrap();

        // Stays cancelled for every later hold
        assert_eq!(token.wait(Duration::from_secs(10)), Hold::Cancelled);
    }

    #[test]
    fn test_thread_context_speed_clamped() {
        let ctx = ThreadContext::new(CancelToken::new()).with_speed(100.0);
        assert_eq!(ctx.speed(), 10.0);
        let ctx = ThreadContext::new(CancelToken::new()).with_speed(0.0);
        assert_eq!(ctx.speed(), 0.1);
    }

    #[test]
    fn test_thread_context_non_finite_speed() {
        let ctx = ThreadContext::new(CancelToken::new()).with_speed(f64::NAN);
        assert_eq!(ctx.speed(), 1.0);
        assert_eq!(ctx.sleep(Duration::from_millis(2)), Hold::Completed);

        let ctx = ThreadContext::new(CancelToken::new()).with_speed(f64::INFINITY);
        assert_eq!(ctx.speed(), 10.0);
        let ctx = ThreadContext::new(CancelToken::new()).with_speed(f64::NEG_INFINITY);
        assert_eq!(ctx.speed(), 0.1);
    }

    #[test]
    fn test_manual_context_records_and_cancels() {
        let clock = ManualClock::new();
        let ctx = ManualContext::new()
            .cancel_at_hold(1)
            .with_clock(clock.clone());

        assert_eq!(ctx.sleep(Duration::from_millis(100)), Hold::Completed);
        assert_eq!(ctx.sleep(Duration::from_millis(200)), Hold::Cancelled);
        assert!(ctx.is_cancelled());
        assert_eq!(
            ctx.holds(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
        assert_eq!(clock.now(), Duration::from_millis(100));
    }
}
