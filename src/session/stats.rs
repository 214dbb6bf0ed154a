// SessionStats - running aggregates over a monitoring session

use serde::{Deserialize, Serialize};

use crate::analysis::compliance::CelebrationReason;
use crate::analysis::Reading;

/// Serializable end-of-session report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub readings: u64,
    pub min_level: Option<f64>,
    pub max_level: Option<f64>,
    pub mean_level: Option<f64>,
    /// Share of readings at or below MEDIUM, `0..=1`
    pub within_limit_ratio: Option<f64>,
    pub limit_restored: u64,
    pub limit_breached: u64,
    /// Whether the high-water latch was set at any point
    pub latched: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    count: u64,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
    within_limit: u64,
    limit_restored: u64,
    limit_breached: u64,
    latched: bool,
    first_ms: Option<u64>,
    last_ms: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, reading: &Reading) {
        let level = reading.level;
        self.count += 1;
        self.sum += level;
        self.min = Some(self.min.map_or(level, |min| min.min(level)));
        self.max = Some(self.max.map_or(level, |max| max.max(level)));

        if reading.compliance.is_compliant() {
            self.within_limit += 1;
        }
        match reading.event.map(|event| event.reason) {
            Some(CelebrationReason::LimitRestored) => self.limit_restored += 1,
            Some(CelebrationReason::LimitBreached) => self.limit_breached += 1,
            None => {}
        }
        self.latched |= reading.latched;

        self.first_ms.get_or_insert(reading.timestamp_ms);
        self.last_ms = self.last_ms.max(reading.timestamp_ms);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn summary(&self) -> SessionSummary {
        let ratio = |n: u64| (self.count > 0).then(|| n as f64 / self.count as f64);
        SessionSummary {
            readings: self.count,
            min_level: self.min,
            max_level: self.max,
            mean_level: (self.count > 0).then(|| round_tenths(self.sum / self.count as f64)),
            within_limit_ratio: ratio(self.within_limit),
            limit_restored: self.limit_restored,
            limit_breached: self.limit_breached,
            latched: self.latched,
            duration_ms: self
                .first_ms
                .map_or(0, |first| self.last_ms.saturating_sub(first)),
        }
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compliance::PolicySetting;
    use crate::analysis::level::LevelScale;
    use crate::analysis::profile::Mode;
    use crate::analysis::NoisePipeline;
    use crate::config::ModeHandle;

    #[test]
    fn test_empty_summary() {
        let summary = SessionStats::new().summary();
        assert_eq!(summary.readings, 0);
        assert_eq!(summary.mean_level, None);
        assert_eq!(summary.within_limit_ratio, None);
        assert_eq!(summary.duration_ms, 0);
    }

    #[test]
    fn test_summary_aggregates_levels_and_events() {
        let mut pipeline = NoisePipeline::new(
            LevelScale::default(),
            ModeHandle::new(Mode::Light),
            PolicySetting::OnRestore,
            3_000,
        );
        let mut stats = SessionStats::new();
        for (level, ts) in [(45.0, 100), (45.0, 200), (35.0, 300), (15.0, 400)] {
            stats.observe(&pipeline.process_level(level, ts));
        }

        let summary = stats.summary();
        assert_eq!(summary.readings, 4);
        assert_eq!(summary.min_level, Some(15.0));
        assert_eq!(summary.max_level, Some(45.0));
        assert_eq!(summary.mean_level, Some(35.0));
        assert_eq!(summary.within_limit_ratio, Some(0.5));
        assert_eq!(summary.limit_restored, 1);
        assert_eq!(summary.limit_breached, 0);
        assert!(!summary.latched);
        assert_eq!(summary.duration_ms, 300);
    }

    #[test]
    fn test_latch_is_reported() {
        let mut pipeline = NoisePipeline::new(
            LevelScale::default(),
            ModeHandle::new(Mode::Light),
            PolicySetting::OnBreach,
            3_000,
        );
        let mut stats = SessionStats::new();
        stats.observe(&pipeline.process_level(30.0, 0));
        stats.observe(&pipeline.process_level(65.0, 16));
        stats.observe(&pipeline.process_level(10.0, 32));

        let summary = stats.summary();
        assert!(summary.latched);
        assert_eq!(summary.limit_breached, 1);
    }
}
