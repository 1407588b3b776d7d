//! Bounded history of recently captured samples

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::format::AudioFormat;
use super::wav;
use crate::domain::error::PipelineError;
use crate::domain::recording::duration::DEFAULT_BUFFER_SECS;

/// Thread-safe FIFO of the most recent samples.
///
/// The capture side appends every frame while any number of reader threads
/// pull a trailing window out of it. All access goes through one mutex; a
/// read copies its window out before releasing the lock, so callers never
/// observe a torn frame.
#[derive(Debug)]
pub struct AudioRingBuffer {
    format: AudioFormat,
    capacity: usize,
    samples: Mutex<VecDeque<i16>>,
}

impl AudioRingBuffer {
    /// Create a buffer holding ten seconds of audio
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self::with_capacity_secs(sample_rate, channels, DEFAULT_BUFFER_SECS)
    }

    /// Create a buffer holding `secs` seconds of audio
    pub fn with_capacity_secs(sample_rate: u32, channels: u16, secs: u64) -> Self {
        let format = AudioFormat::pcm16(sample_rate, channels);
        let capacity = format.samples_for_millis(secs.saturating_mul(1000));
        Self::with_capacity(format, capacity)
    }

    /// Create a buffer with an explicit capacity in samples
    pub fn with_capacity(format: AudioFormat, capacity: usize) -> Self {
        Self {
            format,
            capacity,
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<i16>> {
        // Every critical section leaves the deque valid, so a panic elsewhere
        // cannot leave it half-updated.
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append samples, evicting the oldest ones beyond capacity.
    pub fn add_samples(&self, samples: &[i16]) {
        if samples.is_empty() {
            return;
        }

        let mut buffer = self.lock();

        if samples.len() >= self.capacity {
            buffer.clear();
            buffer.extend(&samples[samples.len() - self.capacity..]);
            return;
        }

        let overflow = (buffer.len() + samples.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            buffer.drain(..overflow);
        }
        buffer.extend(samples);
    }

    /// Copy out the most recent `duration_ms` of audio.
    ///
    /// Returns fewer samples when less history is buffered; never pads.
    pub fn get_last_audio(&self, duration_ms: u64) -> Vec<i16> {
        let wanted = self.format.samples_for_millis(duration_ms);
        let buffer = self.lock();
        let count = wanted.min(buffer.len());
        buffer.range(buffer.len() - count..).copied().collect()
    }

    /// Encode `samples` as a WAV file using this buffer's rate and channels.
    pub fn save_to_wav(&self, samples: &[i16], path: impl AsRef<Path>) -> Result<(), PipelineError> {
        wav::write_wav(path.as_ref(), self.format, samples)
    }

    /// Discard all buffered samples
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Copy of the entire buffered history, oldest first
    pub fn snapshot(&self) -> Vec<i16> {
        self.lock().iter().copied().collect()
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of samples retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.format.channels
    }
}

impl Default for AudioRingBuffer {
    fn default() -> Self {
        Self::new(AudioFormat::SPEECH.sample_rate, AudioFormat::SPEECH.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_buffer(capacity: usize) -> AudioRingBuffer {
        AudioRingBuffer::with_capacity(AudioFormat::SPEECH, capacity)
    }

    #[test]
    fn default_capacity_is_ten_seconds() {
        let buffer = AudioRingBuffer::new(16_000, 1);
        assert_eq!(buffer.capacity(), 160_000);

        let stereo = AudioRingBuffer::new(48_000, 2);
        assert_eq!(stereo.capacity(), 960_000);
    }

    #[test]
    fn empty_append_is_noop() {
        let buffer = small_buffer(4);
        buffer.add_samples(&[]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn evicts_oldest_first() {
        let buffer = small_buffer(4);
        buffer.add_samples(&[1, 2, 3]);
        buffer.add_samples(&[4, 5]);
        assert_eq!(buffer.snapshot(), vec![2, 3, 4, 5]);

        buffer.add_samples(&[6]);
        assert_eq!(buffer.snapshot(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn oversized_append_keeps_tail() {
        let buffer = small_buffer(3);
        buffer.add_samples(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(buffer.snapshot(), vec![5, 6, 7]);
    }

    #[test]
    fn last_audio_returns_available_history() {
        let buffer = small_buffer(64_000);
        buffer.add_samples(&[7; 800]);

        // 100 ms at 16 kHz is 1600 samples but only 800 are buffered
        assert_eq!(buffer.get_last_audio(100).len(), 800);
        assert_eq!(buffer.get_last_audio(0).len(), 0);
        assert_eq!(buffer.get_last_audio(10).len(), 160);
    }

    #[test]
    fn clear_discards_everything() {
        let buffer = small_buffer(8);
        buffer.add_samples(&[1, 2, 3]);
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.get_last_audio(1000).is_empty());
    }
}
