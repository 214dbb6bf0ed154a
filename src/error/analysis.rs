// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// Error code range: 2001-2004
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Frame with zero bins reached the level mapper
    pub const INVALID_FRAME: i32 = 2001;

    /// Threshold triple is not strictly increasing
    pub const INVALID_PROFILE: i32 = 2002;

    /// Level output range is empty or inverted
    pub const INVALID_SCALE: i32 = 2003;

    /// Spectrum analyser parameters are out of range
    pub const INVALID_SPECTRUM_CONFIG: i32 = 2004;
}

/// Log an analysis error with structured context
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=LevelPipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised by the pure analysis stages
///
/// All of these are contract violations: a correctly configured sampler
/// never produces them, so they propagate instead of being coerced.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Frame contained no magnitude bins
    InvalidFrame,

    /// Thresholds violate `low < medium < high`
    InvalidProfile { low: f64, medium: f64, high: f64 },

    /// Level scale violates `min_db < max_db`
    InvalidScale { min_db: f64, max_db: f64 },

    /// Spectrum analyser configuration rejected
    InvalidSpectrumConfig { reason: String },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InvalidFrame => AnalysisErrorCodes::INVALID_FRAME,
            AnalysisError::InvalidProfile { .. } => AnalysisErrorCodes::INVALID_PROFILE,
            AnalysisError::InvalidScale { .. } => AnalysisErrorCodes::INVALID_SCALE,
            AnalysisError::InvalidSpectrumConfig { .. } => {
                AnalysisErrorCodes::INVALID_SPECTRUM_CONFIG
            }
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InvalidFrame => "Audio frame contains no magnitude bins".to_string(),
            AnalysisError::InvalidProfile { low, medium, high } => format!(
                "Thresholds must satisfy low < medium < high (got {} / {} / {})",
                low, medium, high
            ),
            AnalysisError::InvalidScale { min_db, max_db } => format!(
                "Level scale must satisfy min_db < max_db (got {} / {})",
                min_db, max_db
            ),
            AnalysisError::InvalidSpectrumConfig { reason } => {
                format!("Invalid spectrum configuration: {}", reason)
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}
