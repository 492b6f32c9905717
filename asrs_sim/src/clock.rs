//! Cancellable timed waits.
//!
//! A [`StopSignal`] is created once by the supervisor and cloned into every
//! line at construction. [`SimulationClock::wait`] sleeps in fixed sub-steps
//! and re-checks the signal between them, so shutdown latency is bounded by
//! one sub-step rather than by the macro-tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Broadcast, set-once stop flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create an unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request every holder to stop.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// True once `stop()` has been called on any clone.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Sub-stepped sleeper.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    sub_step: Duration,
    stop: StopSignal,
}

impl SimulationClock {
    /// Create a clock bound to `stop`.
    ///
    /// A zero `sub_step` degrades to a single uninterruptible sleep per wait;
    /// configuration validation rejects it for the binary.
    pub fn new(sub_step: Duration, stop: StopSignal) -> Self {
        Self { sub_step, stop }
    }

    /// Sub-step length.
    pub fn sub_step(&self) -> Duration {
        self.sub_step
    }

    /// The signal this clock observes.
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Sleep for `duration` unless stopped first.
    ///
    /// Returns `true` if the full duration elapsed, `false` if the stop
    /// signal was observed (before or during the wait).
    pub fn wait(&self, duration: Duration) -> bool {
        if self.stop.is_stopped() {
            return false;
        }
        if self.sub_step.is_zero() {
            std::thread::sleep(duration);
            return !self.stop.is_stopped();
        }

        let mut remaining = duration;
        while !remaining.is_zero() {
            let chunk = remaining.min(self.sub_step);
            std::thread::sleep(chunk);
            remaining -= chunk;
            if self.stop.is_stopped() {
                return false;
            }
        }
        true
    }
}
