// Audio acquisition error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Acquisition error code constants
///
/// Error code range: 1001-1005
pub struct AcquisitionErrorCodes {}

impl AcquisitionErrorCodes {
    /// Microphone permission denied by the user or OS
    pub const PERMISSION_DENIED: i32 = 1001;

    /// No input device exists
    pub const DEVICE_UNAVAILABLE: i32 = 1002;

    /// Device exists but the stream could not be built or started
    pub const STREAM_OPEN_FAILED: i32 = 1003;

    /// Device sample format is not supported
    pub const UNSUPPORTED_FORMAT: i32 = 1004;

    /// Fixture file could not be read
    pub const FIXTURE_UNREADABLE: i32 = 1005;
}

/// Log an acquisition error with structured context
///
/// Emits the numeric code, the component and the message so failures to
/// start capture can be correlated with the caller that requested them.
pub fn log_acquisition_error(err: &AcquisitionError, context: &str) {
    error!(
        "Acquisition error in {}: code={}, component=SignalSampler, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while acquiring an audio input stream
///
/// These are fatal to starting a sampling loop and are never retried
/// automatically; retrying is a caller decision.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    /// Microphone permission denied
    PermissionDenied,

    /// No input device available
    DeviceUnavailable,

    /// Failed to build or start the input stream
    StreamOpenFailed { reason: String },

    /// Input sample format not handled by the sampler
    UnsupportedFormat { format: String },

    /// Fixture audio could not be opened or decoded
    FixtureUnreadable { reason: String },
}

impl ErrorCode for AcquisitionError {
    fn code(&self) -> i32 {
        match self {
            AcquisitionError::PermissionDenied => AcquisitionErrorCodes::PERMISSION_DENIED,
            AcquisitionError::DeviceUnavailable => AcquisitionErrorCodes::DEVICE_UNAVAILABLE,
            AcquisitionError::StreamOpenFailed { .. } => AcquisitionErrorCodes::STREAM_OPEN_FAILED,
            AcquisitionError::UnsupportedFormat { .. } => {
                AcquisitionErrorCodes::UNSUPPORTED_FORMAT
            }
            AcquisitionError::FixtureUnreadable { .. } => {
                AcquisitionErrorCodes::FIXTURE_UNREADABLE
            }
        }
    }

    fn message(&self) -> String {
        match self {
            AcquisitionError::PermissionDenied => {
                "Microphone permission denied. Please grant microphone access.".to_string()
            }
            AcquisitionError::DeviceUnavailable => "No audio input device available".to_string(),
            AcquisitionError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AcquisitionError::UnsupportedFormat { format } => {
                format!("Unsupported input sample format: {}", format)
            }
            AcquisitionError::FixtureUnreadable { reason } => {
                format!("Fixture audio unreadable: {}", reason)
            }
        }
    }
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AcquisitionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AcquisitionError {}
