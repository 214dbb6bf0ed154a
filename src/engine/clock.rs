//! Monotonic time sources for tick timestamps and throttling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Trait representing a monotonic time source used for reading timestamps.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic time source for tests and replays.
///
/// Time only moves through [`ManualClock::advance`] or, when built with
/// [`ManualClock::with_step`], by a fixed step on every `now()` call.
pub struct ManualClock {
    start: Instant,
    offset_ms: AtomicU64,
    step_ms: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::with_step(Duration::ZERO)
    }

    /// Clock that advances by `step` each time it is read
    pub fn with_step(step: Duration) -> Self {
        Self {
            start: Instant::now(),
            offset_ms: AtomicU64::new(0),
            step_ms: step.as_millis() as u64,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Milliseconds elapsed on this clock
    pub fn elapsed_ms(&self) -> u64 {
        self.offset_ms.load(Ordering::SeqCst)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Instant {
        let ms = self.offset_ms.fetch_add(self.step_ms, Ordering::SeqCst);
        self.start + Duration::from_millis(ms)
    }
}
