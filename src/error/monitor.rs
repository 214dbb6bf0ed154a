// Sampling loop lifecycle errors

use crate::error::{AcquisitionError, AnalysisError, ErrorCode};
use std::fmt;

/// Monitor error code constants
///
/// Error code range: 3001-3003. Wrapped acquisition and analysis errors
/// keep their own codes.
pub struct MonitorErrorCodes {}

impl MonitorErrorCodes {
    /// Sampling loop already running
    pub const ALREADY_RUNNING: i32 = 3001;

    /// Worker thread could not be spawned
    pub const WORKER_SPAWN_FAILED: i32 = 3002;

    /// Worker thread panicked before finishing
    pub const WORKER_PANICKED: i32 = 3003;
}

/// Errors surfaced by `SamplingLoop::start` / `SamplingLoop::stop`
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// Opening the audio source failed
    Acquisition(AcquisitionError),

    /// A tick hit an analysis contract violation
    Analysis(AnalysisError),

    /// `start` called while a worker is active
    AlreadyRunning,

    /// OS refused to spawn the worker thread
    WorkerSpawnFailed { reason: String },

    /// Worker thread panicked
    WorkerPanicked,
}

impl ErrorCode for MonitorError {
    fn code(&self) -> i32 {
        match self {
            MonitorError::Acquisition(err) => err.code(),
            MonitorError::Analysis(err) => err.code(),
            MonitorError::AlreadyRunning => MonitorErrorCodes::ALREADY_RUNNING,
            MonitorError::WorkerSpawnFailed { .. } => MonitorErrorCodes::WORKER_SPAWN_FAILED,
            MonitorError::WorkerPanicked => MonitorErrorCodes::WORKER_PANICKED,
        }
    }

    fn message(&self) -> String {
        match self {
            MonitorError::Acquisition(err) => err.message(),
            MonitorError::Analysis(err) => err.message(),
            MonitorError::AlreadyRunning => {
                "Sampling loop already running. Call stop() first.".to_string()
            }
            MonitorError::WorkerSpawnFailed { reason } => {
                format!("Failed to spawn sampling worker: {}", reason)
            }
            MonitorError::WorkerPanicked => "Sampling worker panicked".to_string(),
        }
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MonitorError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Acquisition(err) => Some(err),
            MonitorError::Analysis(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AcquisitionError> for MonitorError {
    fn from(err: AcquisitionError) -> Self {
        MonitorError::Acquisition(err)
    }
}

impl From<AnalysisError> for MonitorError {
    fn from(err: AnalysisError) -> Self {
        MonitorError::Analysis(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_their_codes() {
        let err: MonitorError = AcquisitionError::PermissionDenied.into();
        assert_eq!(err.code(), 1001);

        let err: MonitorError = AnalysisError::InvalidFrame.into();
        assert_eq!(err.code(), 2001);
    }

    #[test]
    fn test_lifecycle_codes() {
        assert_eq!(MonitorError::AlreadyRunning.code(), 3001);
        assert_eq!(
            MonitorError::WorkerSpawnFailed {
                reason: "test".to_string()
            }
            .code(),
            3002
        );
        assert_eq!(MonitorError::WorkerPanicked.code(), 3003);
    }

    #[test]
    fn test_error_propagation() {
        fn open() -> Result<(), AcquisitionError> {
            Err(AcquisitionError::DeviceUnavailable)
        }

        fn start() -> Result<(), MonitorError> {
            open()?;
            Ok(())
        }

        match start() {
            Err(MonitorError::Acquisition(AcquisitionError::DeviceUnavailable)) => {}
            other => panic!("Expected wrapped DeviceUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = MonitorError::Analysis(AnalysisError::InvalidFrame);
        assert!(err.source().is_some());
        assert!(MonitorError::AlreadyRunning.source().is_none());
    }
}
