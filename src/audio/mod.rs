// Audio module - capture providers and spectral magnitude frames

pub mod frame;
pub mod sample_ring;
pub mod scripted;
pub mod simulated;
pub mod source;
pub mod spectrum;
pub mod wav_source;

#[cfg(not(target_os = "android"))]
pub mod cpal_source;

// Re-export commonly used types for convenience
pub use frame::AudioFrame;
pub use sample_ring::{SampleReader, SampleRing, SampleWriter, DEFAULT_RING_CAPACITY};
pub use scripted::{ScriptedHandle, ScriptedSource};
pub use simulated::{SimulatedHandle, SimulatedSource};
pub use source::{AudioSource, CaptureHandle};
pub use spectrum::SpectrumAnalyser;
pub use wav_source::{WavHandle, WavSource};

#[cfg(not(target_os = "android"))]
pub use cpal_source::{CpalHandle, CpalSource};
