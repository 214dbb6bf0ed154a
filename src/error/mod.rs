// Error types for the noise monitor
//
// This module defines custom error types for audio acquisition, level
// analysis and sampling-loop lifecycle, each carrying a stable numeric code.

mod acquisition;
mod analysis;
mod monitor;

pub use acquisition::{log_acquisition_error, AcquisitionError, AcquisitionErrorCodes};
pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use monitor::{MonitorError, MonitorErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the CLI and any embedding presentation layer.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
