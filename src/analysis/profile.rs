// Threshold profiles - mode-dependent cut points for level classification

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Monitoring mode selected by the hard-mode toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Light,
    Hard,
}

impl Mode {
    pub fn from_hard_flag(hard: bool) -> Self {
        if hard {
            Mode::Hard
        } else {
            Mode::Light
        }
    }

    pub fn is_hard(self) -> bool {
        matches!(self, Mode::Hard)
    }

    /// Canonical thresholds for this mode
    pub fn profile(self) -> ThresholdProfile {
        match self {
            Mode::Light => ThresholdProfile::LIGHT,
            Mode::Hard => ThresholdProfile::HARD,
        }
    }

    /// Gauge range shown for this mode.
    ///
    /// Hard mode extends the dial to 180 so its HIGH threshold (160) stays
    /// on the scale.
    pub fn gauge_range(self) -> (f64, f64) {
        match self {
            Mode::Light => (0.0, 140.0),
            Mode::Hard => (0.0, 180.0),
        }
    }
}

/// Ordered `{low, medium, high}` threshold triple
///
/// Invariant: `low < medium < high`, enforced by [`ThresholdProfile::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    low: f64,
    medium: f64,
    high: f64,
}

impl ThresholdProfile {
    pub const LIGHT: ThresholdProfile = ThresholdProfile {
        low: 20.0,
        medium: 40.0,
        high: 60.0,
    };

    pub const HARD: ThresholdProfile = ThresholdProfile {
        low: 60.0,
        medium: 110.0,
        high: 160.0,
    };

    pub fn new(low: f64, medium: f64, high: f64) -> Result<Self, AnalysisError> {
        // NaN fails both comparisons and is rejected here as well
        if !(low < medium && medium < high) {
            return Err(AnalysisError::InvalidProfile { low, medium, high });
        }
        Ok(Self { low, medium, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn medium(&self) -> f64 {
        self.medium
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Position of `level` on a gauge spanning `range`, clamped to `0..=1`
    pub fn gauge_fraction(level: f64, range: (f64, f64)) -> f64 {
        let (min, max) = range;
        if max <= min {
            return 0.0;
        }
        let clamped = level.clamp(min, max);
        (clamped - min) / (max - min)
    }

    /// Arc lengths of the low/medium/high bands on a gauge spanning `range`
    pub fn gauge_arcs(&self, range: (f64, f64)) -> [f64; 3] {
        let low = Self::gauge_fraction(self.low, range);
        let medium = Self::gauge_fraction(self.medium, range);
        [low, medium - low, 1.0 - medium]
    }
}
