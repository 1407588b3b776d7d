//! Recording port interfaces

use std::sync::Arc;
use std::time::Duration;

use crate::domain::audio::AudioFormat;
use crate::domain::error::PipelineError;
use crate::domain::lifecycle::RecorderState;
use crate::domain::recording::duration::DEFAULT_STOP_TIMEOUT_SECS;

/// What the capture thread should do after delivering a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkControl {
    /// Keep delivering frames
    Continue,
    /// Stop delivering; the capture thread winds down on its own
    Halt,
}

/// Receiver of captured audio.
///
/// Called on the capture thread once per hardware period, in the order the
/// driver produced the frames. A recorder only calls into its sink between
/// `start()` and the completion of `stop()`.
pub trait FrameSink: Send + Sync {
    fn on_frame(&self, samples: &[i16]) -> SinkControl;
}

/// Options fixed when a recorder is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderOptions {
    /// Upper bound on how long `stop()` waits for the capture thread
    pub stop_timeout: Duration,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS),
        }
    }
}

/// Port for a single capture stream.
///
/// State machine: CREATED -open-> READY -start-> RECORDING -stop-> READY
/// -close-> CREATED. Out-of-order calls are rejected without side effects.
pub trait Recorder: Send {
    /// Bind a capture stream on `device` (or the default input device).
    fn open(&mut self, device: Option<&str>, format: AudioFormat) -> Result<(), PipelineError>;

    /// Spawn the capture thread and begin delivering frames.
    fn start(&mut self) -> Result<(), PipelineError>;

    /// Halt capture and block until the capture thread has exited.
    ///
    /// No frame is delivered after this returns `Ok`. Fails with `Timeout`
    /// when the thread does not exit within the configured bound.
    fn stop(&mut self) -> Result<(), PipelineError>;

    /// Release the stream. Stops first if still recording. Idempotent.
    fn close(&mut self);

    fn state(&self) -> RecorderState;

    /// True once the capture thread is no longer delivering frames, either
    /// because `stop()` completed or because the sink asked it to halt.
    fn is_capture_finished(&self) -> bool;
}

/// Port for a platform capture backend.
///
/// Selected once at configuration time; hands out recorders bound to a sink.
pub trait RecorderBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Number of devices able to capture audio
    fn input_device_count(&self) -> usize;

    /// Name of the default capture device, if any
    fn default_input_device(&self) -> Option<String>;

    /// Names of all capture devices
    fn input_device_names(&self) -> Vec<String>;

    /// Create a recorder in the CREATED state.
    ///
    /// Fails with `AllocationFailure` if the audio subsystem cannot start.
    fn create(
        &self,
        sink: Arc<dyn FrameSink>,
        options: RecorderOptions,
    ) -> Result<Box<dyn Recorder>, PipelineError>;
}
