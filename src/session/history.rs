// SessionHistory - bounded history of recent readings for charting

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::{Category, ComplianceState};
use crate::analysis::Reading;

/// One charted point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp_ms: u64,
    pub level: f64,
    pub category: Category,
    pub compliance: ComplianceState,
}

impl From<&Reading> for HistoryEntry {
    fn from(reading: &Reading) -> Self {
        Self {
            timestamp_ms: reading.timestamp_ms,
            level: reading.level,
            category: reading.category,
            compliance: reading.compliance,
        }
    }
}

/// Rolling window of the most recent readings
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    evicted: u64,
}

impl SessionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    pub fn record(&mut self, reading: &Reading) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(HistoryEntry::from(reading));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries pushed out by newer ones
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Entries no older than `window` before the latest one
    pub fn within(&self, window: Duration) -> Vec<HistoryEntry> {
        let Some(latest) = self.latest() else {
            return Vec::new();
        };
        let cutoff = latest
            .timestamp_ms
            .saturating_sub(window.as_millis() as u64);
        self.entries
            .iter()
            .filter(|entry| entry.timestamp_ms >= cutoff)
            .copied()
            .collect()
    }

    /// Mean level over `window`, if any entries fall inside it
    pub fn average_within(&self, window: Duration) -> Option<f64> {
        let entries = self.within(window);
        if entries.is_empty() {
            return None;
        }
        let sum: f64 = entries.iter().map(|entry| entry.level).sum();
        Some(sum / entries.len() as f64)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.evicted = 0;
    }
}
