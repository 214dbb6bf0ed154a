// SampleRing - lock-free hand-off from the capture callback to the sampler
//
// The device callback owns the producer and pushes mono samples; when the
// ring is full the newest samples are dropped instead of blocking the audio
// thread. The sampler owns the consumer and drains everything available
// into a rolling window of the most recent `fft_size` samples.

use std::collections::VecDeque;

use rtrb::{Consumer, Producer};

/// Default ring capacity: ~340 ms at 48 kHz
pub const DEFAULT_RING_CAPACITY: usize = 16_384;

/// Capture-side half of the ring
pub struct SampleWriter {
    producer: Producer<f32>,
    dropped: u64,
}

impl SampleWriter {
    /// Push the first channel of an interleaved buffer
    ///
    /// Returns the number of samples dropped because the ring was full.
    pub fn push_interleaved<I>(&mut self, samples: I, channels: usize) -> usize
    where
        I: IntoIterator<Item = f32>,
    {
        let channels = channels.max(1);
        let mut dropped = 0;
        for sample in samples.into_iter().step_by(channels) {
            if self.producer.push(sample).is_err() {
                dropped += 1;
            }
        }
        self.dropped += dropped as u64;
        dropped
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Sampler-side half of the ring plus the rolling analysis window
pub struct SampleReader {
    consumer: Consumer<f32>,
    window: VecDeque<f32>,
    window_len: usize,
}

impl SampleReader {
    /// Drain all available samples. Never blocks.
    ///
    /// Returns how many new samples arrived.
    pub fn drain(&mut self) -> usize {
        let mut received = 0;
        while let Ok(sample) = self.consumer.pop() {
            if self.window.len() == self.window_len {
                self.window.pop_front();
            }
            self.window.push_back(sample);
            received += 1;
        }
        received
    }

    /// Current window, oldest sample first
    pub fn window(&mut self) -> &[f32] {
        self.window.make_contiguous()
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }
}

pub struct SampleRing;

impl SampleRing {
    /// Create a ring of `capacity` samples feeding a window of `window_len`
    ///
    /// # Panics
    /// Panics if capacity or window_len is 0
    #[allow(clippy::new_ret_no_self)]
    pub fn new(capacity: usize, window_len: usize) -> (SampleWriter, SampleReader) {
        assert!(capacity > 0, "capacity must be greater than 0");
        assert!(window_len > 0, "window_len must be greater than 0");

        let (producer, consumer) = rtrb::RingBuffer::new(capacity);
        (
            SampleWriter {
                producer,
                dropped: 0,
            },
            SampleReader {
                consumer,
                window: VecDeque::with_capacity(window_len),
                window_len,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_keeps_most_recent_window() {
        let (mut writer, mut reader) = SampleRing::new(64, 4);
        writer.push_interleaved((0..6).map(|v| v as f32), 1);

        assert_eq!(reader.drain(), 6);
        assert_eq!(reader.window(), &[2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_drain_on_empty_ring_is_noop() {
        let (_writer, mut reader) = SampleRing::new(8, 4);
        assert_eq!(reader.drain(), 0);
        assert!(reader.window().is_empty());
    }

    #[test]
    fn test_interleaved_takes_first_channel() {
        let (mut writer, mut reader) = SampleRing::new(16, 8);
        // L/R pairs: left = 1,2,3 right = -1,-2,-3
        writer.push_interleaved([1.0, -1.0, 2.0, -2.0, 3.0, -3.0], 2);
        reader.drain();
        assert_eq!(reader.window(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_full_ring_drops_newest() {
        let (mut writer, mut reader) = SampleRing::new(2, 8);
        let dropped = writer.push_interleaved([1.0, 2.0, 3.0], 1);
        assert_eq!(dropped, 1);
        assert_eq!(writer.dropped(), 1);
        reader.drain();
        assert_eq!(reader.window(), &[1.0, 2.0]);
    }

    #[test]
    fn test_send() {
        fn assert_send<T: Send>() {}
        assert_send::<SampleWriter>();
        assert_send::<SampleReader>();
    }
}
