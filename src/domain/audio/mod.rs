//! Audio value objects: PCM format, ring buffer history and WAV codec

pub mod format;
pub mod ring_buffer;
pub mod wav;

pub use format::{AudioFormat, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
pub use ring_buffer::AudioRingBuffer;
pub use wav::{read_wav, write_wav};
