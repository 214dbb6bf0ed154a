// Ticker - one sample → map → classify → update → publish step
//
// Owns the open capture handle for the whole session and closes it when
// dropped, so every exit path of the worker releases the device.

use std::time::Instant;

use super::cadence::Throttle;
use crate::analysis::{NoisePipeline, Reading};
use crate::audio::CaptureHandle;
use crate::error::AnalysisError;

pub struct Ticker<H: CaptureHandle> {
    handle: H,
    pipeline: NoisePipeline,
    throttle: Throttle,
    started_at: Instant,
    ticks: u64,
}

impl<H: CaptureHandle> Ticker<H> {
    pub fn new(handle: H, pipeline: NoisePipeline, throttle: Throttle, started_at: Instant) -> Self {
        Self {
            handle,
            pipeline,
            throttle,
            started_at,
            ticks: 0,
        }
    }

    /// Run one tick at `now`
    ///
    /// Returns `Ok(None)` when the throttle withholds the reading.
    pub fn tick(&mut self, now: Instant) -> Result<Option<Reading>, AnalysisError> {
        let frame = self.handle.sample();
        let timestamp_ms = now.saturating_duration_since(self.started_at).as_millis() as u64;
        let reading = self.pipeline.process(&frame, timestamp_ms)?;
        self.ticks += 1;

        if self.throttle.should_publish(now, reading.event.is_some()) {
            Ok(Some(reading))
        } else {
            Ok(None)
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pipeline(&self) -> &NoisePipeline {
        &self.pipeline
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn close(&mut self) {
        self.handle.close();
    }
}

impl<H: CaptureHandle> Drop for Ticker<H> {
    fn drop(&mut self) {
        self.handle.close();
    }
}
