//! RIFF/WAVE PCM codec

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use super::format::AudioFormat;
use crate::domain::error::PipelineError;

/// Write `samples` as a 16-bit PCM WAV file in one pass.
pub fn write_wav(path: &Path, format: AudioFormat, samples: &[i16]) -> Result<(), PipelineError> {
    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| PipelineError::Wav(format!("cannot open {}: {}", path.display(), e)))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| PipelineError::Wav(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| PipelineError::Wav(e.to_string()))?;

    debug!(path = %path.display(), samples = samples.len(), "wrote wav file");
    Ok(())
}

/// Read a 16-bit integer PCM WAV file.
///
/// Returns the file's format and its interleaved samples.
pub fn read_wav(path: &Path) -> Result<(AudioFormat, Vec<i16>), PipelineError> {
    let reader = WavReader::open(path)
        .map_err(|e| PipelineError::Wav(format!("cannot open {}: {}", path.display(), e)))?;

    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(PipelineError::InvalidArgument(format!(
            "{} is not 16-bit integer PCM ({} bit {:?})",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PipelineError::Wav(e.to_string()))?;

    Ok((AudioFormat::pcm16(spec.sample_rate, spec.channels), samples))
}
