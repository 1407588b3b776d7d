//! Sample conversion from device format to 16kHz mono i16

use rubato::{FftFixedIn, Resampler};

use crate::domain::audio::SPEECH_SAMPLE_RATE;
use crate::domain::error::PipelineError;

/// Resampler input chunk, in frames
const RESAMPLE_CHUNK: usize = 1024;

pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

pub fn u16_to_i16(sample: u16) -> i16 {
    (sample as i32 - 32768) as i16
}

/// Average interleaved channels down to mono
pub fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / chunk.len() as i32) as i16
        })
        .collect()
}

/// Streaming resampler that carries partial chunks across calls
pub struct StreamResampler {
    resampler: FftFixedIn<f32>,
    source_rate: u32,
    pending: Vec<f32>,
    consumed: u64,
    produced: u64,
}

impl StreamResampler {
    pub fn new(source_rate: u32) -> Result<Self, PipelineError> {
        let resampler = FftFixedIn::<f32>::new(
            source_rate as usize,
            SPEECH_SAMPLE_RATE as usize,
            RESAMPLE_CHUNK,
            2, // Sub-chunks
            1, // Mono
        )
        .map_err(|e| PipelineError::AllocationFailure(format!("resampler init failed: {}", e)))?;

        Ok(Self {
            resampler,
            source_rate,
            pending: Vec::with_capacity(RESAMPLE_CHUNK * 2),
            consumed: 0,
            produced: 0,
        })
    }

    /// Feed mono samples; returns whatever full chunks produced
    pub fn process(&mut self, mono: &[i16]) -> Result<Vec<i16>, PipelineError> {
        self.pending
            .extend(mono.iter().map(|&s| s as f32 / 32768.0));
        self.consumed += mono.len() as u64;

        let mut output = Vec::new();
        loop {
            let needed = self.resampler.input_frames_next();
            if self.pending.len() < needed {
                break;
            }

            let chunk: Vec<Vec<f32>> = vec![self.pending.drain(..needed).collect()];
            self.run_chunk(&chunk, &mut output)?;
        }

        self.produced += output.len() as u64;
        Ok(output)
    }

    /// Zero-pad and resample the buffered partial chunk, trimming the
    /// output to the length the consumed input maps to. Resets the stream.
    pub fn finish(&mut self) -> Result<Vec<i16>, PipelineError> {
        let mut output = Vec::new();
        if !self.pending.is_empty() {
            let needed = self.resampler.input_frames_next();
            let mut padded: Vec<f32> = self.pending.drain(..).collect();
            padded.resize(needed, 0.0);
            self.run_chunk(&[padded], &mut output)?;
        }

        let expected = self.consumed * SPEECH_SAMPLE_RATE as u64 / self.source_rate as u64;
        let remaining = expected.saturating_sub(self.produced) as usize;
        output.truncate(remaining);

        self.resampler.reset();
        self.consumed = 0;
        self.produced = 0;
        Ok(output)
    }

    fn run_chunk(
        &mut self,
        chunk: &[Vec<f32>],
        output: &mut Vec<i16>,
    ) -> Result<(), PipelineError> {
        let resampled = self
            .resampler
            .process(chunk, None)
            .map_err(|e| PipelineError::RecordFailure(format!("resampling failed: {}", e)))?;
        output.extend(resampled[0].iter().map(|&s| f32_to_i16(s)));
        Ok(())
    }
}

/// Device-to-speech frame converter
pub struct FrameConverter {
    channels: u16,
    resampler: Option<StreamResampler>,
}

impl FrameConverter {
    pub fn new(source_rate: u32, channels: u16) -> Result<Self, PipelineError> {
        let resampler = if source_rate == SPEECH_SAMPLE_RATE {
            None
        } else {
            Some(StreamResampler::new(source_rate)?)
        };
        Ok(Self {
            channels,
            resampler,
        })
    }

    pub fn needs_resampling(&self) -> bool {
        self.resampler.is_some()
    }

    /// Convert one interleaved device buffer. May return an empty frame
    /// while the resampler is still filling a chunk.
    pub fn convert(&mut self, interleaved: &[i16]) -> Result<Vec<i16>, PipelineError> {
        let mono = downmix(interleaved, self.channels);
        match self.resampler.as_mut() {
            Some(resampler) => resampler.process(&mono),
            None => Ok(mono),
        }
    }

    /// Convert a complete recording, flushing the resampler tail
    pub fn convert_all(&mut self, interleaved: &[i16]) -> Result<Vec<i16>, PipelineError> {
        let mut output = self.convert(interleaved)?;
        if let Some(resampler) = self.resampler.as_mut() {
            output.extend(resampler.finish()?);
        }
        Ok(output)
    }
}
