//! Configuration management for the noise monitor
//!
//! Runtime configuration is loaded from a JSON file so thresholds-adjacent
//! parameters (analyser shape, level scale, celebration window, cadence)
//! can be tuned without recompilation. Missing or malformed files fall back
//! to defaults with a warning.
//!
//! The hard-mode flag also lives here as a [`ModeHandle`]: a cloneable shared
//! handle the caller writes and the sampling worker reads on every tick.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::compliance::{PolicySetting, DEFAULT_CELEBRATION_WINDOW_MS};
use crate::analysis::level::LevelScale;
use crate::analysis::profile::Mode;
use crate::audio::DEFAULT_RING_CAPACITY;
use crate::error::AnalysisError;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampler: SamplerConfig,
    pub level: LevelConfig,
    pub celebration: CelebrationConfig,
    pub cadence: CadenceConfig,
    /// Initial mode; the dashboard starts in hard mode
    pub hard_mode: bool,
    /// Readings retained by the session history
    pub history_capacity: usize,
}

/// Spectrum analyser parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// FFT window size in samples (power of two)
    pub fft_size: usize,
    /// Exponential smoothing between frames (0 = none, 1 = frozen)
    pub smoothing_time_constant: f32,
    /// dB value mapped to magnitude 0
    pub min_decibels: f32,
    /// dB value mapped to magnitude 255
    pub max_decibels: f32,
    /// Capacity of the capture ring buffer in samples
    pub ring_capacity: usize,
}

impl SamplerConfig {
    /// Bins per frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

/// Level mapper output range
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub min_db: f64,
    pub max_db: f64,
}

impl LevelConfig {
    pub fn scale(&self) -> Result<LevelScale, AnalysisError> {
        LevelScale::new(self.min_db, self.max_db)
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            min_db: 0.0,
            max_db: 140.0,
        }
    }
}

/// Celebration window and trigger policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CelebrationConfig {
    pub window_ms: u64,
    pub policy: PolicySetting,
}

impl Default for CelebrationConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_CELEBRATION_WINDOW_MS,
            policy: PolicySetting::FollowMode,
        }
    }
}

/// Tick scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    /// Interval between ticks (16 ms ~ one display frame)
    pub tick_interval_ms: u64,
    /// Publish at most once per this many milliseconds
    pub throttle_ms: Option<u64>,
}

impl CadenceConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn throttle(&self) -> Option<Duration> {
        self.throttle_ms.map(Duration::from_millis)
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            throttle_ms: None,
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            level: LevelConfig::default(),
            celebration: CelebrationConfig::default(),
            cadence: CadenceConfig::default(),
            hard_mode: true,
            history_capacity: 600,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or the
    /// JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/noise_config.json")
    }

    /// Mode handle seeded from `hard_mode`
    pub fn mode_handle(&self) -> ModeHandle {
        ModeHandle::new(Mode::from_hard_flag(self.hard_mode))
    }
}

/// Shared hard-mode flag
///
/// Clones observe the same flag. Writes take effect on the next tick of any
/// sampling loop holding a clone.
#[derive(Debug, Clone)]
pub struct ModeHandle {
    hard: Arc<AtomicBool>,
}

impl ModeHandle {
    pub fn new(mode: Mode) -> Self {
        Self {
            hard: Arc::new(AtomicBool::new(mode.is_hard())),
        }
    }

    pub fn get(&self) -> Mode {
        Mode::from_hard_flag(self.hard.load(Ordering::Acquire))
    }

    pub fn set(&self, mode: Mode) {
        self.set_hard(mode.is_hard());
    }

    pub fn set_hard(&self, hard: bool) {
        self.hard.store(hard, Ordering::Release);
    }

    /// Flip the mode, returning the new one
    pub fn toggle(&self) -> Mode {
        let was_hard = self.hard.fetch_xor(true, Ordering::AcqRel);
        Mode::from_hard_flag(!was_hard)
    }
}

impl Default for ModeHandle {
    fn default() -> Self {
        Self::new(Mode::Hard)
    }
}
