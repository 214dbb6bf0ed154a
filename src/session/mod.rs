//! Session bookkeeping for published readings.
//!
//! A [`Session`] collects the readings a caller receives from the sampling
//! loop into a bounded [`SessionHistory`] for charting and running
//! [`SessionStats`] for the end-of-session summary.

pub mod history;
pub mod stats;

pub use history::{HistoryEntry, SessionHistory};
pub use stats::{SessionStats, SessionSummary};

use crate::analysis::Reading;

#[derive(Debug, Clone)]
pub struct Session {
    history: SessionHistory,
    stats: SessionStats,
}

impl Session {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: SessionHistory::new(history_capacity),
            stats: SessionStats::new(),
        }
    }

    pub fn record(&mut self, reading: &Reading) {
        self.history.record(reading);
        self.stats.observe(reading);
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn summary(&self) -> SessionSummary {
        self.stats.summary()
    }
}
