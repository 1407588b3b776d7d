//! Replay capture backend
//!
//! Plays prerecorded PCM through the recorder port in fixed periods, as if
//! it were coming from a microphone.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::capture_thread::{CaptureSlot, CaptureThread};
use super::convert::FrameConverter;
use crate::application::ports::{FrameSink, Recorder, RecorderBackend, RecorderOptions, SinkControl};
use crate::domain::audio::{read_wav, AudioFormat};
use crate::domain::error::PipelineError;
use crate::domain::lifecycle::RecorderState;

/// Frames per delivered period
pub const DEFAULT_PERIOD_FRAMES: usize = 1024;

/// How replayed periods are spaced in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// One period per period duration, like real hardware
    #[default]
    RealTime,
    /// As fast as the sink accepts frames
    Unpaced,
}

/// Backend replaying one clip of 16kHz mono audio
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    label: String,
    samples: Arc<Vec<i16>>,
    period_frames: usize,
    pacing: Pacing,
    looping: bool,
}

impl ReplayBackend {
    pub fn from_samples(label: impl Into<String>, samples: Vec<i16>) -> Self {
        Self {
            label: label.into(),
            samples: Arc::new(samples),
            period_frames: DEFAULT_PERIOD_FRAMES,
            pacing: Pacing::default(),
            looping: false,
        }
    }

    /// Load a 16-bit WAV file, converting it to 16kHz mono
    pub fn from_wav(path: &Path) -> Result<Self, PipelineError> {
        let (format, samples) = read_wav(path)?;
        let samples = if format == AudioFormat::SPEECH {
            samples
        } else {
            debug!(%format, "converting replay clip to speech format");
            FrameConverter::new(format.sample_rate, format.channels)?.convert_all(&samples)?
        };

        info!(path = %path.display(), samples = samples.len(), "loaded replay clip");
        Ok(Self::from_samples(path.display().to_string(), samples))
    }

    pub fn with_period_frames(mut self, frames: usize) -> Self {
        self.period_frames = frames.max(1);
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Restart from the beginning instead of ending after the last period
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl RecorderBackend for ReplayBackend {
    fn name(&self) -> &str {
        "replay"
    }

    fn input_device_count(&self) -> usize {
        1
    }

    fn default_input_device(&self) -> Option<String> {
        Some(self.label.clone())
    }

    fn input_device_names(&self) -> Vec<String> {
        vec![self.label.clone()]
    }

    fn create(
        &self,
        sink: Arc<dyn FrameSink>,
        options: RecorderOptions,
    ) -> Result<Box<dyn Recorder>, PipelineError> {
        Ok(Box::new(ReplayRecorder {
            clip: self.clone(),
            sink,
            slot: CaptureSlot::new(options.stop_timeout),
        }))
    }
}

/// Recorder delivering a replay clip from its own capture thread
pub struct ReplayRecorder {
    clip: ReplayBackend,
    sink: Arc<dyn FrameSink>,
    slot: CaptureSlot,
}

impl Recorder for ReplayRecorder {
    fn open(&mut self, device: Option<&str>, format: AudioFormat) -> Result<(), PipelineError> {
        if self.slot.state() != RecorderState::Created {
            return Err(PipelineError::AlreadyActive(format!(
                "open recorder while {}",
                self.slot.state()
            )));
        }
        if format != AudioFormat::SPEECH {
            return Err(PipelineError::InvalidArgument(format!(
                "unsupported capture format {}",
                format
            )));
        }
        if let Some(name) = device {
            if name != self.clip.label {
                return Err(PipelineError::DeviceUnavailable(name.to_string()));
            }
        }
        self.slot.open()
    }

    fn start(&mut self) -> Result<(), PipelineError> {
        self.slot.check_startable()?;

        let samples = Arc::clone(&self.clip.samples);
        let sink = Arc::clone(&self.sink);
        let period = self.clip.period_frames;
        let pacing = self.clip.pacing;
        let looping = self.clip.looping;
        let period_duration = AudioFormat::SPEECH.millis_for_samples(period);

        let thread = CaptureThread::spawn("wake-capture-replay", move |control| {
            if samples.is_empty() {
                return;
            }

            let mut delivered = 0usize;
            'replay: loop {
                for frame in samples.chunks(period) {
                    if control.is_stop_requested() {
                        break 'replay;
                    }
                    if sink.on_frame(frame) == SinkControl::Halt {
                        control.request_stop();
                        break 'replay;
                    }
                    delivered += 1;

                    if pacing == Pacing::RealTime
                        && control.wait_for_stop_timeout(Duration::from_millis(period_duration))
                    {
                        break 'replay;
                    }
                }
                if !looping {
                    break;
                }
            }
            debug!(periods = delivered, "replay finished");
        })?;

        self.slot.begin(thread)
    }

    fn stop(&mut self) -> Result<(), PipelineError> {
        self.slot.stop()
    }

    fn close(&mut self) {
        self.slot.close();
    }

    fn state(&self) -> RecorderState {
        self.slot.state()
    }

    fn is_capture_finished(&self) -> bool {
        self.slot.is_capture_finished()
    }
}

impl Drop for ReplayRecorder {
    fn drop(&mut self) {
        self.close();
    }
}
