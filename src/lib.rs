// Noise Monitor Core - ambient noise level monitoring
// Spectral capture, level classification and compliance tracking

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;

// Re-exports for convenience
pub use analysis::classifier::{classify, Category, Classification, ComplianceState};
pub use analysis::compliance::{
    CelebrationEvent, CelebrationReason, ComplianceMachine, HighWaterLatch, Intensity,
    PolicySetting, TriggerPolicy,
};
pub use analysis::level::{map_level, LevelScale};
pub use analysis::profile::{Mode, ThresholdProfile};
pub use analysis::{NoisePipeline, Reading};
pub use audio::{AudioFrame, AudioSource, CaptureHandle};
pub use config::{AppConfig, ModeHandle};
pub use engine::{Cadence, ManualClock, SamplingLoop, SystemTimeSource, TimeSource};
pub use error::{AcquisitionError, AnalysisError, ErrorCode, MonitorError};
pub use session::{Session, SessionSummary};
