//! Cross-platform audio capture using cpal
//!
//! Device audio is converted to the speech format before delivery:
//! - 16kHz sample rate (resampled from the device rate when needed)
//! - Mono channel
//! - 16-bit signed samples

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, SizedSample, StreamConfig};
use tracing::{debug, info, warn};

use super::capture_thread::{CaptureControl, CaptureSlot, CaptureThread};
use super::convert::{f32_to_i16, u16_to_i16, FrameConverter};
use crate::application::ports::{FrameSink, Recorder, RecorderBackend, RecorderOptions, SinkControl};
use crate::domain::audio::{AudioFormat, SPEECH_SAMPLE_RATE};
use crate::domain::error::PipelineError;
use crate::domain::lifecycle::RecorderState;

/// Stream parameters chosen at `open()`
#[derive(Debug, Clone)]
struct InputSelection {
    /// `None` selects the host default at stream build time
    device_name: Option<String>,
    config: StreamConfig,
    sample_format: SampleFormat,
}

fn input_devices(host: &cpal::Host) -> Vec<cpal::Device> {
    match host.input_devices() {
        Ok(devices) => devices.collect(),
        Err(e) => {
            warn!(error = %e, "failed to enumerate input devices");
            Vec::new()
        }
    }
}

fn find_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device, PipelineError> {
    match name {
        None => host.default_input_device().ok_or_else(|| {
            PipelineError::DeviceUnavailable("no default input device".to_string())
        }),
        Some(name) => input_devices(host)
            .into_iter()
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| PipelineError::DeviceUnavailable(name.to_string())),
    }
}

/// Pick a supported configuration, preferring ones that include 16kHz and
/// fewer channels.
fn select_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), PipelineError> {
    let supported = device
        .supported_input_configs()
        .map_err(|e| PipelineError::DeviceUnavailable(format!("failed to get configs: {}", e)))?;

    let includes_target = |c: &cpal::SupportedStreamConfigRange| {
        c.min_sample_rate().0 <= SPEECH_SAMPLE_RATE && c.max_sample_rate().0 >= SPEECH_SAMPLE_RATE
    };

    let mut best: Option<cpal::SupportedStreamConfigRange> = None;
    for config in supported {
        if !matches!(
            config.sample_format(),
            SampleFormat::I16 | SampleFormat::F32 | SampleFormat::U16
        ) {
            continue;
        }

        let is_better = match &best {
            None => true,
            Some(current) => {
                let better_rate = includes_target(&config) && !includes_target(current);
                let fewer_channels = includes_target(&config) == includes_target(current)
                    && config.channels() < current.channels();
                better_rate || fewer_channels
            }
        };
        if is_better {
            best = Some(config);
        }
    }

    let range = best.ok_or_else(|| {
        PipelineError::DeviceUnavailable("no supported sample format".to_string())
    })?;

    let rate = SPEECH_SAMPLE_RATE.clamp(range.min_sample_rate().0, range.max_sample_rate().0);
    let sample_format = range.sample_format();
    let config = StreamConfig {
        channels: range.channels(),
        sample_rate: SampleRate(rate),
        buffer_size: cpal::BufferSize::Default,
    };

    Ok((config, sample_format))
}

/// Per-stream delivery state owned by the cpal data callback
struct Delivery {
    gate: Arc<AtomicBool>,
    control: Arc<CaptureControl>,
    sink: Arc<dyn FrameSink>,
    converter: FrameConverter,
}

impl Delivery {
    fn push(&mut self, interleaved: &[i16]) {
        if !self.gate.load(Ordering::Acquire) {
            return;
        }

        let frame = match self.converter.convert(interleaved) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "dropping capture after conversion failure");
                self.halt();
                return;
            }
        };
        if frame.is_empty() {
            return;
        }

        if self.sink.on_frame(&frame) == SinkControl::Halt {
            debug!("sink halted capture");
            self.halt();
        }
    }

    fn halt(&self) {
        self.gate.store(false, Ordering::Release);
        self.control.request_stop();
    }
}

fn build_stream<T, F>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut delivery: Delivery,
    to_i16: F,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    F: Fn(T) -> i16 + Send + 'static,
{
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let samples: Vec<i16> = data.iter().map(|&s| to_i16(s)).collect();
            delivery.push(&samples);
        },
        |err| warn!(error = %err, "audio stream error"),
        None,
    )
}

fn open_stream(
    selection: &InputSelection,
    delivery: Delivery,
) -> Result<cpal::Stream, PipelineError> {
    let host = cpal::default_host();
    let device = find_device(&host, selection.device_name.as_deref())?;
    let config = &selection.config;

    let stream = match selection.sample_format {
        SampleFormat::I16 => build_stream::<i16, _>(&device, config, delivery, |s| s),
        SampleFormat::F32 => build_stream::<f32, _>(&device, config, delivery, f32_to_i16),
        SampleFormat::U16 => build_stream::<u16, _>(&device, config, delivery, u16_to_i16),
        other => {
            return Err(PipelineError::RecordFailure(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    };

    stream.map_err(|e| PipelineError::RecordFailure(e.to_string()))
}

/// Microphone recorder bound to one cpal input stream
pub struct CpalRecorder {
    sink: Arc<dyn FrameSink>,
    slot: CaptureSlot,
    input: Option<InputSelection>,
}

impl CpalRecorder {
    pub fn new(sink: Arc<dyn FrameSink>, options: RecorderOptions) -> Self {
        Self {
            sink,
            slot: CaptureSlot::new(options.stop_timeout),
            input: None,
        }
    }
}

impl Recorder for CpalRecorder {
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

        let host = cpal::default_host();
        if input_devices(&host).is_empty() {
            return Err(PipelineError::InvalidArgument(
                "no input devices available".to_string(),
            ));
        }

        let cpal_device = find_device(&host, device)?;
        let (config, sample_format) = select_config(&cpal_device)?;
        let device_name = cpal_device.name().ok();

        info!(
            device = device_name.as_deref().unwrap_or("default"),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            format = ?sample_format,
            "input device opened"
        );

        self.slot.open()?;
        self.input = Some(InputSelection {
            device_name: device.map(str::to_string),
            config,
            sample_format,
        });
        Ok(())
    }

    fn start(&mut self) -> Result<(), PipelineError> {
        self.slot.check_startable()?;
        let selection = self
            .input
            .clone()
            .ok_or_else(|| PipelineError::NotReady("start an unopened recorder".to_string()))?;

        let converter = FrameConverter::new(selection.config.sample_rate.0, selection.config.channels)?;
        let gate = Arc::new(AtomicBool::new(true));
        let sink = Arc::clone(&self.sink);
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), PipelineError>>(1);

        let thread_gate = Arc::clone(&gate);
        let mut thread = CaptureThread::spawn("wake-capture-cpal", move |control| {
            let delivery = Delivery {
                gate: Arc::clone(&thread_gate),
                control: Arc::clone(&control),
                sink,
                converter,
            };

            // cpal::Stream is not Send, so it lives and dies on this thread
            let stream = match open_stream(&selection, delivery).and_then(|stream| {
                stream
                    .play()
                    .map_err(|e| PipelineError::RecordFailure(e.to_string()))?;
                Ok(stream)
            }) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            control.wait_for_stop();
            thread_gate.store(false, Ordering::Release);
            drop(stream);
        })?;

        let started = match ready_rx.recv_timeout(self.slot.stop_timeout()) {
            Ok(result) => result,
            Err(_) => Err(PipelineError::RecordFailure(
                "capture stream did not start".to_string(),
            )),
        };

        if let Err(e) = started {
            gate.store(false, Ordering::Release);
            if thread.stop(self.slot.stop_timeout()).is_err() {
                thread.detach();
            }
            return Err(e);
        }

        self.slot.begin(thread)?;
        debug!("cpal capture started");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PipelineError> {
        self.slot.stop()?;
        debug!("cpal capture stopped");
        Ok(())
    }

    fn close(&mut self) {
        self.slot.close();
        self.input = None;
    }

    fn state(&self) -> RecorderState {
        self.slot.state()
    }

    fn is_capture_finished(&self) -> bool {
        self.slot.is_capture_finished()
    }
}

impl Drop for CpalRecorder {
    fn drop(&mut self) {
        self.close();
    }
}

/// Capture backend over the host's default cpal API
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl RecorderBackend for CpalBackend {
    fn name(&self) -> &str {
        "cpal"
    }

    fn input_device_count(&self) -> usize {
        input_devices(&cpal::default_host()).len()
    }

    fn default_input_device(&self) -> Option<String> {
        cpal::default_host()
            .default_input_device()
            .and_then(|d| d.name().ok())
    }

    fn input_device_names(&self) -> Vec<String> {
        input_devices(&cpal::default_host())
            .iter()
            .filter_map(|d| d.name().ok())
            .collect()
    }

    fn create(
        &self,
        sink: Arc<dyn FrameSink>,
        options: RecorderOptions,
    ) -> Result<Box<dyn Recorder>, PipelineError> {
        Ok(Box::new(CpalRecorder::new(sink, options)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSink;

    impl FrameSink for NullSink {
        fn on_frame(&self, _samples: &[i16]) -> SinkControl {
            SinkControl::Continue
        }
    }

    fn recorder() -> CpalRecorder {
        CpalRecorder::new(Arc::new(NullSink), RecorderOptions::default())
    }

    #[test]
    fn new_recorder_is_created() {
        let rec = recorder();
        assert_eq!(rec.state(), RecorderState::Created);
        assert!(rec.is_capture_finished());
    }

    #[test]
    fn start_before_open_is_not_ready() {
        let mut rec = recorder();
        assert!(matches!(rec.start(), Err(PipelineError::NotReady(_))));
        assert_eq!(rec.state(), RecorderState::Created);
    }

    #[test]
    fn stop_before_start_is_not_ready() {
        let mut rec = recorder();
        assert!(matches!(rec.stop(), Err(PipelineError::NotReady(_))));
    }

    #[test]
    fn open_rejects_non_speech_format() {
        let mut rec = recorder();
        let err = rec.open(None, AudioFormat::pcm16(44_100, 2)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArgument(_)));
        assert_eq!(rec.state(), RecorderState::Created);
    }

    #[test]
    fn close_is_idempotent() {
        let mut rec = recorder();
        rec.close();
        rec.close();
        assert_eq!(rec.state(), RecorderState::Created);
    }
}
