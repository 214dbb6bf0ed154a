// WavSource - deterministic replay of a recorded WAV file
//
// Each `sample` call advances the read position by one hop (by default one
// display frame at 60 Hz) and analyses the newest `fft_size` samples before
// the new position. After the end of the file the last frame repeats.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::source::{AudioSource, CaptureHandle};
use super::spectrum::SpectrumAnalyser;
use super::AudioFrame;
use crate::config::SamplerConfig;
use crate::error::{AcquisitionError, AnalysisError};

/// Ticks per second assumed when no explicit hop is configured
pub const DEFAULT_TICKS_PER_SECOND: u32 = 60;

pub struct WavSource {
    path: PathBuf,
    analyser: SpectrumAnalyser,
    hop: Option<usize>,
}

impl WavSource {
    pub fn new(path: impl Into<PathBuf>, config: &SamplerConfig) -> Result<Self, AnalysisError> {
        Ok(Self {
            path: path.into(),
            analyser: SpectrumAnalyser::new(config)?,
            hop: None,
        })
    }

    /// Advance by `hop` samples per tick instead of one 60 Hz frame
    pub fn with_hop(mut self, hop: usize) -> Self {
        self.hop = Some(hop.max(1));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Playback length of the file
    pub fn duration(&self) -> Result<Duration, AcquisitionError> {
        let reader = hound::WavReader::open(&self.path).map_err(|err| unreadable(&self.path, err))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(AcquisitionError::FixtureUnreadable {
                reason: format!("{} reports a zero sample rate", self.path.display()),
            });
        }
        Ok(Duration::from_secs_f64(
            reader.duration() as f64 / spec.sample_rate as f64,
        ))
    }
}

impl AudioSource for WavSource {
    type Handle = WavHandle;

    fn open(&self) -> Result<WavHandle, AcquisitionError> {
        let (samples, sample_rate) = read_wav(&self.path)?;
        let hop = self
            .hop
            .unwrap_or_else(|| (sample_rate / DEFAULT_TICKS_PER_SECOND).max(1) as usize);

        let mut analyser = self.analyser.clone();
        analyser.reset();
        let bin_count = analyser.bin_count();

        log::info!(
            "[WavSource] Replaying {} ({} samples at {} Hz, hop {})",
            self.path.display(),
            samples.len(),
            sample_rate,
            hop
        );

        Ok(WavHandle {
            samples,
            position: 0,
            hop,
            analyser,
            last_frame: AudioFrame::silent(bin_count),
            open: true,
        })
    }

    fn describe(&self) -> String {
        format!("wav fixture {}", self.path.display())
    }
}

pub struct WavHandle {
    samples: Vec<f32>,
    position: usize,
    hop: usize,
    analyser: SpectrumAnalyser,
    last_frame: AudioFrame,
    open: bool,
}

impl WavHandle {
    pub fn is_finished(&self) -> bool {
        self.position >= self.samples.len()
    }
}

impl CaptureHandle for WavHandle {
    fn sample(&mut self) -> AudioFrame {
        if !self.open || self.is_finished() {
            return self.last_frame.clone();
        }

        let end = (self.position + self.hop).min(self.samples.len());
        let start = end.saturating_sub(self.analyser.fft_size());
        let frame = self.analyser.process(&self.samples[start..end]);
        self.position = end;
        self.last_frame = frame.clone();
        frame
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.samples = Vec::new();
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

fn unreadable(path: &Path, err: hound::Error) -> AcquisitionError {
    AcquisitionError::FixtureUnreadable {
        reason: format!("failed to open {}: {err}", path.display()),
    }
}

/// Decode a WAV file into mono f32 samples
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32), AcquisitionError> {
    let mut reader = hound::WavReader::open(path).map_err(|err| unreadable(path, err))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AcquisitionError::FixtureUnreadable {
            reason: format!("{} has zero channels", path.display()),
        });
    }

    let read_err = |err: hound::Error| AcquisitionError::FixtureUnreadable {
        reason: format!("error reading {}: {err}", path.display()),
    };

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(read_err))
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|sample| sample.map(|v| v as f32 / i16::MAX as f32).map_err(read_err))
                .collect::<Result<Vec<f32>, _>>()?,
            24 => reader
                .samples::<i32>()
                .map(|sample| sample.map(|v| v as f32 / 8_388_607.0).map_err(read_err))
                .collect::<Result<Vec<f32>, _>>()?,
            32 => reader
                .samples::<i32>()
                .map(|sample| sample.map(|v| v as f32 / i32::MAX as f32).map_err(read_err))
                .collect::<Result<Vec<f32>, _>>()?,
            bits => {
                return Err(AcquisitionError::UnsupportedFormat {
                    format: format!("{}-bit integer PCM in {}", bits, path.display()),
                })
            }
        },
    };

    if spec.channels == 1 {
        return Ok((samples, spec.sample_rate));
    }

    let mut mono = Vec::with_capacity(samples.len() / spec.channels as usize);
    for chunk in samples.chunks(spec.channels as usize) {
        let sum: f32 = chunk.iter().copied().sum();
        mono.push(sum / spec.channels as f32);
    }

    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tone(path: &Path, amplitude: f32, seconds: f32, channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let frames = (48_000.0 * seconds) as usize;
        for i in 0..frames {
            let v = amplitude * (2.0 * std::f32::consts::PI * 1_000.0 * i as f32 / 48_000.0).sin();
            for _ in 0..channels {
                writer.write_sample((v * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("noise_monitor_{}_{}.wav", name, std::process::id()))
    }

    #[test]
    fn test_replay_advances_and_holds_last_frame() {
        let path = temp_path("replay");
        write_tone(&path, 0.5, 0.1, 1);

        let source = WavSource::new(&path, &SamplerConfig::default())
            .unwrap()
            .with_hop(1_600);
        let mut handle = source.open().unwrap();

        // 4800 samples / 1600 hop = 3 frames
        for _ in 0..3 {
            let frame = handle.sample();
            assert_eq!(frame.len(), 128);
            assert!(frame.bins().iter().any(|&b| b > 0));
        }
        assert!(handle.is_finished());
        let held = handle.last_frame.clone();
        assert_eq!(handle.sample(), held);

        handle.close();
        handle.close();
        assert!(!handle.is_open());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_stereo_is_mixed_to_mono() {
        let path = temp_path("stereo");
        write_tone(&path, 0.25, 0.01, 2);

        let (samples, rate) = read_wav(&path).unwrap();
        assert_eq!(rate, 48_000);
        assert_eq!(samples.len(), 480);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_duration_reports_file_length() {
        let path = temp_path("duration");
        write_tone(&path, 0.1, 0.5, 1);

        let source = WavSource::new(&path, &SamplerConfig::default()).unwrap();
        let duration = source.duration().unwrap();
        assert!((duration.as_secs_f64() - 0.5).abs() < 1e-3);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let source =
            WavSource::new("/nonexistent/definitely_missing.wav", &SamplerConfig::default())
                .unwrap();
        assert!(matches!(
            source.open(),
            Err(AcquisitionError::FixtureUnreadable { .. })
        ));
    }
}
