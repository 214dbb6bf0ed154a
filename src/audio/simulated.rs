// SimulatedSource - random noise feed for demos without a microphone
//
// Every `sample` picks a target level uniformly in the configured range and
// builds a frame whose bins jitter around the matching magnitude.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::source::{AudioSource, CaptureHandle};
use super::AudioFrame;
use crate::analysis::level::LevelScale;
use crate::error::AcquisitionError;

/// Per-bin jitter around the target magnitude
const BIN_JITTER: i16 = 8;

pub struct SimulatedSource {
    min_level: f64,
    max_level: f64,
    scale: LevelScale,
    bin_count: usize,
    seed: Option<u64>,
}

impl SimulatedSource {
    /// Feed producing levels between `min_level` and `max_level` on `scale`
    pub fn new(min_level: f64, max_level: f64, scale: LevelScale, bin_count: usize) -> Self {
        let (min_level, max_level) = if min_level <= max_level {
            (min_level, max_level)
        } else {
            (max_level, min_level)
        };
        Self {
            min_level,
            max_level,
            scale,
            bin_count: bin_count.max(1),
            seed: None,
        }
    }

    /// Deterministic sequence for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl AudioSource for SimulatedSource {
    type Handle = SimulatedHandle;

    fn open(&self) -> Result<SimulatedHandle, AcquisitionError> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(SimulatedHandle {
            rng,
            min_level: self.min_level,
            max_level: self.max_level,
            scale: self.scale,
            bin_count: self.bin_count,
            open: true,
            last_frame: AudioFrame::silent(self.bin_count),
        })
    }

    fn describe(&self) -> String {
        format!("simulated feed {:.0}-{:.0}", self.min_level, self.max_level)
    }
}

pub struct SimulatedHandle {
    rng: StdRng,
    min_level: f64,
    max_level: f64,
    scale: LevelScale,
    bin_count: usize,
    open: bool,
    last_frame: AudioFrame,
}

impl CaptureHandle for SimulatedHandle {
    fn sample(&mut self) -> AudioFrame {
        if !self.open {
            return self.last_frame.clone();
        }
        let target = if self.min_level < self.max_level {
            self.rng.gen_range(self.min_level..=self.max_level)
        } else {
            self.min_level
        };
        let center = self.scale.magnitude_for(target) as i16;
        let bins = (0..self.bin_count)
            .map(|_| {
                let jitter = self.rng.gen_range(-BIN_JITTER..=BIN_JITTER);
                (center + jitter).clamp(0, 255) as u8
            })
            .collect();
        self.last_frame = AudioFrame::new(bins);
        self.last_frame.clone()
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
