//! PCM format value object

use std::fmt;

/// Sample rate the recognition engine consumes
pub const SPEECH_SAMPLE_RATE: u32 = 16_000;

/// Channel count the recognition engine consumes
pub const SPEECH_CHANNELS: u16 = 1;

/// Bits per sample the recognition engine consumes
pub const SPEECH_BITS_PER_SAMPLE: u16 = 16;

/// Interleaved signed PCM format description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// 16 kHz, mono, 16-bit little-endian PCM
    pub const SPEECH: Self = Self {
        sample_rate: SPEECH_SAMPLE_RATE,
        channels: SPEECH_CHANNELS,
        bits_per_sample: SPEECH_BITS_PER_SAMPLE,
    };

    /// Create a 16-bit format with the given rate and channel count
    pub const fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample: 16,
        }
    }

    /// Number of interleaved samples covering `duration_ms`, rounded down
    pub fn samples_for_millis(&self, duration_ms: u64) -> usize {
        let total = duration_ms
            .saturating_mul(u64::from(self.sample_rate))
            .saturating_mul(u64::from(self.channels))
            / 1000;
        usize::try_from(total).unwrap_or(usize::MAX)
    }

    /// Duration in milliseconds represented by `samples` interleaved samples
    pub fn millis_for_samples(&self, samples: usize) -> u64 {
        let per_second = u64::from(self.sample_rate) * u64::from(self.channels);
        if per_second == 0 {
            return 0;
        }
        samples as u64 * 1000 / per_second
    }

    /// Bytes per second of audio in this format
    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * (self.bits_per_sample as u32 / 8)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::SPEECH
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz / {} ch / {} bit",
            self.sample_rate, self.channels, self.bits_per_sample
        )
    }
}
