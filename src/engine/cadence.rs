// Cadence - tick interval and publish throttling
//
// Ticks run at a fixed interval (one display frame by default). An optional
// throttle limits how often readings are published; ticks that fire a
// compliance event always publish so no event is lost to throttling.

use std::time::{Duration, Instant};

use crate::config::CadenceConfig;

/// Publish gate for throttled loops
#[derive(Debug)]
pub struct Throttle {
    min_interval: Option<Duration>,
    last_at: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Option<Duration>) -> Self {
        Self {
            min_interval,
            last_at: None,
        }
    }

    /// Gate that publishes every tick
    pub fn unthrottled() -> Self {
        Self::new(None)
    }

    pub fn min_interval(&self) -> Option<Duration> {
        self.min_interval
    }

    /// Whether a reading produced at `now` should be published
    ///
    /// Event ticks always publish and restart the interval from `now`.
    pub fn should_publish(&mut self, now: Instant, has_event: bool) -> bool {
        let past_rate_limit = match (self.min_interval, self.last_at) {
            (None, _) | (_, None) => true,
            (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
        };

        if has_event || past_rate_limit {
            self.last_at = Some(now);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last_at = None;
    }
}

/// Tick interval plus publish throttle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub tick_interval: Duration,
    pub throttle: Option<Duration>,
}

impl Cadence {
    /// ~60 Hz, every tick published
    pub fn frame_synced() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            throttle: None,
        }
    }

    pub fn throttled(tick_interval: Duration, min_interval: Duration) -> Self {
        Self {
            tick_interval,
            throttle: Some(min_interval),
        }
    }

    pub fn throttle_gate(&self) -> Throttle {
        Throttle::new(self.throttle)
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::frame_synced()
    }
}

impl From<&CadenceConfig> for Cadence {
    fn from(config: &CadenceConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            throttle: config.throttle(),
        }
    }
}
