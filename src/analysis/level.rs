// Level mapper - spectral magnitude frame to bounded level
//
// The level is a monotonic loudness proxy, not a calibrated dB(A) value:
// the mean bin magnitude (0-255) is rescaled linearly onto a fixed output
// range and rounded to one decimal place.

use serde::{Deserialize, Serialize};

use crate::audio::AudioFrame;
use crate::error::AnalysisError;

/// Largest magnitude a bin can carry
pub const MAX_MAGNITUDE: f64 = 255.0;

/// Output range of the level mapper
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelScale {
    min_db: f64,
    max_db: f64,
}

impl LevelScale {
    pub fn new(min_db: f64, max_db: f64) -> Result<Self, AnalysisError> {
        if !(min_db < max_db) || !min_db.is_finite() || !max_db.is_finite() {
            return Err(AnalysisError::InvalidScale { min_db, max_db });
        }
        Ok(Self { min_db, max_db })
    }

    pub fn min_db(&self) -> f64 {
        self.min_db
    }

    pub fn max_db(&self) -> f64 {
        self.max_db
    }

    /// Inverse mapping: magnitude whose uniform frame maps to `level`
    pub fn magnitude_for(&self, level: f64) -> u8 {
        let fraction = (level - self.min_db) / (self.max_db - self.min_db);
        (fraction * MAX_MAGNITUDE).round().clamp(0.0, MAX_MAGNITUDE) as u8
    }
}

impl Default for LevelScale {
    fn default() -> Self {
        Self {
            min_db: 0.0,
            max_db: 140.0,
        }
    }
}

/// Map one frame to a level on `scale`
///
/// # Errors
/// `InvalidFrame` when the frame has no bins.
pub fn map_level(frame: &AudioFrame, scale: &LevelScale) -> Result<f64, AnalysisError> {
    let bins = frame.bins();
    if bins.is_empty() {
        return Err(AnalysisError::InvalidFrame);
    }

    let sum: u64 = bins.iter().map(|&b| b as u64).sum();
    let average = sum as f64 / bins.len() as f64;
    let level = scale.min_db + (average / MAX_MAGNITUDE) * (scale.max_db - scale.min_db);

    Ok(round_tenths(level))
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
