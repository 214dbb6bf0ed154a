use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::sample_ring::{SampleReader, SampleRing, SampleWriter};
use super::source::{AudioSource, CaptureHandle};
use super::spectrum::SpectrumAnalyser;
use super::AudioFrame;
use crate::config::SamplerConfig;
use crate::error::{AcquisitionError, AnalysisError};

/// Microphone capture through the default cpal host
pub struct CpalSource {
    config: SamplerConfig,
    analyser: SpectrumAnalyser,
}

impl CpalSource {
    pub fn new(config: SamplerConfig) -> Result<Self, AnalysisError> {
        let analyser = SpectrumAnalyser::new(&config)?;
        Ok(Self { config, analyser })
    }
}

impl AudioSource for CpalSource {
    type Handle = CpalHandle;

    fn open(&self) -> Result<CpalHandle, AcquisitionError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AcquisitionError::DeviceUnavailable)?;

        let supported = device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => {
                AcquisitionError::DeviceUnavailable
            }
            cpal::DefaultStreamConfigError::BackendSpecific { err } => {
                classify_backend_error(&err.description)
            }
            other => AcquisitionError::StreamOpenFailed {
                reason: format!("Failed to get default input config: {}", other),
            },
        })?;

        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();
        let sample_rate = stream_config.sample_rate.0;

        let (writer, reader) = SampleRing::new(self.config.ring_capacity, self.config.fft_size);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32, _>(&device, &stream_config, writer, |s| s),
            cpal::SampleFormat::I16 => build_stream::<i16, _>(&device, &stream_config, writer, |s| {
                s as f32 / i16::MAX as f32
            }),
            cpal::SampleFormat::U16 => build_stream::<u16, _>(&device, &stream_config, writer, |s| {
                (s as f32 - 32_768.0) / 32_768.0
            }),
            other => {
                return Err(AcquisitionError::UnsupportedFormat {
                    format: format!("{:?}", other),
                })
            }
        }
        .map_err(map_build_error)?;

        stream.play().map_err(map_play_error)?;

        log::info!(
            "[CpalSource] Capturing from {} at {} Hz ({} channel(s))",
            device.name().unwrap_or_else(|_| "unknown device".to_string()),
            sample_rate,
            stream_config.channels
        );

        let mut analyser = self.analyser.clone();
        analyser.reset();
        let bin_count = analyser.bin_count();

        Ok(CpalHandle {
            stream: Some(stream),
            reader,
            analyser,
            last_frame: AudioFrame::silent(bin_count),
        })
    }

    fn describe(&self) -> String {
        format!("microphone (fft_size={})", self.config.fft_size)
    }
}

/// Open microphone stream; released on `close` or drop
pub struct CpalHandle {
    stream: Option<cpal::Stream>,
    reader: SampleReader,
    analyser: SpectrumAnalyser,
    last_frame: AudioFrame,
}

impl CaptureHandle for CpalHandle {
    fn sample(&mut self) -> AudioFrame {
        if self.stream.is_none() {
            return self.last_frame.clone();
        }
        // No new audio: either the device stalled or it disconnected.
        // The two are indistinguishable here, so the last frame repeats.
        if self.reader.drain() == 0 {
            return self.last_frame.clone();
        }
        let frame = self.analyser.process(self.reader.window());
        self.last_frame = frame.clone();
        frame
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                log::debug!("[CpalSource] Pause before close failed: {}", err);
            }
            drop(stream);
            log::info!("[CpalSource] Input stream closed");
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for CpalHandle {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_stream<T, F>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut writer: SampleWriter,
    convert: F,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample,
    F: Fn(T) -> f32 + Send + 'static,
{
    let channels = config.channels as usize;
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            writer.push_interleaved(data.iter().map(|&s| convert(s)), channels);
        },
        |err| log::warn!("[CpalSource] Input stream error: {}", err),
        None,
    )
}

fn map_build_error(err: cpal::BuildStreamError) -> AcquisitionError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => AcquisitionError::DeviceUnavailable,
        cpal::BuildStreamError::BackendSpecific { err } => classify_backend_error(&err.description),
        other => AcquisitionError::StreamOpenFailed {
            reason: other.to_string(),
        },
    }
}

#[allow(unreachable_patterns)]
fn map_play_error(err: cpal::PlayStreamError) -> AcquisitionError {
    match err {
        cpal::PlayStreamError::DeviceNotAvailable => AcquisitionError::DeviceUnavailable,
        cpal::PlayStreamError::BackendSpecific { err } => classify_backend_error(&err.description),
        other => AcquisitionError::StreamOpenFailed {
            reason: format!("Input start failed: {}", other),
        },
    }
}

/// Backends report OS permission refusals as free-form text
fn classify_backend_error(description: &str) -> AcquisitionError {
    let lower = description.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized")
    {
        AcquisitionError::PermissionDenied
    } else {
        AcquisitionError::StreamOpenFailed {
            reason: description.to_string(),
        }
    }
}
