// ScriptedSource - deterministic frames for tests, demos and replays
//
// Frames play in order; once exhausted the last frame repeats, matching the
// last-known-frame behaviour of live sources. Open handles are counted so
// callers can verify that every acquired handle was released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::source::{AudioSource, CaptureHandle};
use super::AudioFrame;
use crate::analysis::level::LevelScale;
use crate::error::AcquisitionError;

#[derive(Debug, Default)]
struct HandleCounters {
    open: AtomicUsize,
    opened_total: AtomicUsize,
}

/// Clones share the script and the handle counters
#[derive(Clone)]
pub struct ScriptedSource {
    frames: Arc<Vec<AudioFrame>>,
    failure: Option<AcquisitionError>,
    counters: Arc<HandleCounters>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<AudioFrame>) -> Self {
        Self {
            frames: Arc::new(frames),
            failure: None,
            counters: Arc::new(HandleCounters::default()),
        }
    }

    /// One uniform frame per level so each maps back to (about) that level
    pub fn from_levels(levels: &[f64], scale: &LevelScale, bin_count: usize) -> Self {
        let frames = levels
            .iter()
            .map(|&level| AudioFrame::uniform(bin_count, scale.magnitude_for(level)))
            .collect();
        Self::new(frames)
    }

    /// Source whose `open` always fails with `err`
    pub fn failing(err: AcquisitionError) -> Self {
        Self {
            failure: Some(err),
            ..Self::new(Vec::new())
        }
    }

    /// Handles currently open
    pub fn open_handles(&self) -> usize {
        self.counters.open.load(Ordering::SeqCst)
    }

    /// Successful `open` calls so far
    pub fn opened_total(&self) -> usize {
        self.counters.opened_total.load(Ordering::SeqCst)
    }
}

impl AudioSource for ScriptedSource {
    type Handle = ScriptedHandle;

    fn open(&self) -> Result<ScriptedHandle, AcquisitionError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.counters.open.fetch_add(1, Ordering::SeqCst);
        self.counters.opened_total.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedHandle {
            frames: Arc::clone(&self.frames),
            next: 0,
            counters: Arc::clone(&self.counters),
            open: true,
        })
    }

    fn describe(&self) -> String {
        format!("scripted ({} frames)", self.frames.len())
    }
}

pub struct ScriptedHandle {
    frames: Arc<Vec<AudioFrame>>,
    next: usize,
    counters: Arc<HandleCounters>,
    open: bool,
}

impl ScriptedHandle {
    /// Frames handed out so far, capped at the script length
    pub fn position(&self) -> usize {
        self.next
    }
}

impl CaptureHandle for ScriptedHandle {
    fn sample(&mut self) -> AudioFrame {
        let Some(last_index) = self.frames.len().checked_sub(1) else {
            return AudioFrame::default();
        };
        let index = self.next.min(last_index);
        if self.open && self.next <= last_index {
            self.next += 1;
        }
        self.frames[index].clone()
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.counters.open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for ScriptedHandle {
    fn drop(&mut self) {
        self.close();
    }
}
