// Spectrum analyser - time-domain window to byte magnitude bins
//
// Produces the same shape of data a browser analyser node exposes:
// Blackman window, FFT, magnitude normalized by FFT size, exponential
// smoothing across calls, conversion to dB, then a linear map of
// [min_decibels, max_decibels] onto 0-255.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::AudioFrame;
use crate::config::SamplerConfig;
use crate::error::AnalysisError;

const MIN_FFT_SIZE: usize = 32;
const MAX_FFT_SIZE: usize = 32_768;

/// FFT-based analyser with per-bin smoothing state
#[derive(Clone)]
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    /// Blackman window (pre-computed)
    window: Vec<f32>,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyser {
    pub fn new(config: &SamplerConfig) -> Result<Self, AnalysisError> {
        validate(config)?;

        let fft_size = config.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let window = blackman_window(fft_size);

        Ok(Self {
            fft,
            fft_size,
            window,
            smoothing: config.smoothing_time_constant,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
            smoothed: vec![0.0; fft_size / 2],
            scratch: Vec::with_capacity(fft_size),
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Clear smoothing history
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Analyse the newest `fft_size` samples of `audio`
    ///
    /// Shorter input is zero-padded at the front so the most recent samples
    /// stay aligned with the end of the window.
    pub fn process(&mut self, audio: &[f32]) -> AudioFrame {
        let take = audio.len().min(self.fft_size);
        let recent = &audio[audio.len() - take..];
        let padding = self.fft_size - take;

        self.scratch.clear();
        self.scratch
            .extend(std::iter::repeat(Complex::new(0.0, 0.0)).take(padding));
        self.scratch.extend(
            recent
                .iter()
                .zip(&self.window[padding..])
                .map(|(&sample, &w)| Complex::new(sample * w, 0.0)),
        );

        self.fft.process(&mut self.scratch);

        let scale = 1.0 / self.fft_size as f32;
        let min_decibels = self.min_decibels;
        let range = self.max_decibels - min_decibels;
        let tau = self.smoothing;

        let bins = self
            .smoothed
            .iter_mut()
            .zip(&self.scratch)
            .map(|(smoothed, c)| {
                let magnitude = c.norm() * scale;
                *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
                to_byte(*smoothed, min_decibels, range)
            })
            .collect();

        AudioFrame::new(bins)
    }
}

fn to_byte(magnitude: f32, min_decibels: f32, range: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 * (db - min_decibels) / range;
    scaled.clamp(0.0, 255.0) as u8
}

fn blackman_window(size: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = 2.0 * std::f32::consts::PI * i as f32 / n;
            A0 - A1 * x.cos() + A2 * (2.0 * x).cos()
        })
        .collect()
}

fn validate(config: &SamplerConfig) -> Result<(), AnalysisError> {
    let size = config.fft_size;
    if !size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&size) {
        return Err(AnalysisError::InvalidSpectrumConfig {
            reason: format!(
                "fft_size must be a power of two in {}..={} (got {})",
                MIN_FFT_SIZE, MAX_FFT_SIZE, size
            ),
        });
    }
    if !(0.0..=1.0).contains(&config.smoothing_time_constant) {
        return Err(AnalysisError::InvalidSpectrumConfig {
            reason: format!(
                "smoothing_time_constant must be within 0..=1 (got {})",
                config.smoothing_time_constant
            ),
        });
    }
    if !(config.min_decibels < config.max_decibels) {
        return Err(AnalysisError::InvalidSpectrumConfig {
            reason: format!(
                "min_decibels must be below max_decibels (got {} / {})",
                config.min_decibels, config.max_decibels
            ),
        });
    }
    if config.ring_capacity == 0 {
        return Err(AnalysisError::InvalidSpectrumConfig {
            reason: "ring_capacity must be greater than 0".to_string(),
        });
    }
    Ok(())
}
