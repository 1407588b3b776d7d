//! Recorder lifecycle tests against the replay backend

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use wake_capture::application::ports::{FrameSink, Recorder, RecorderBackend, RecorderOptions, SinkControl};
use wake_capture::domain::audio::AudioFormat;
use wake_capture::domain::error::PipelineError;
use wake_capture::domain::lifecycle::RecorderState;
use wake_capture::infrastructure::recording::{Pacing, ReplayBackend};

/// Sink counting frames; halts after `halt_after` frames when set
#[derive(Default)]
struct CountingSink {
    frames: AtomicUsize,
    samples: Mutex<Vec<i16>>,
    halt_after: Option<usize>,
}

impl CountingSink {
    fn halting_after(frames: usize) -> Self {
        Self {
            halt_after: Some(frames),
            ..Default::default()
        }
    }

    fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

impl FrameSink for CountingSink {
    fn on_frame(&self, samples: &[i16]) -> SinkControl {
        let seen = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
        self.samples.lock().unwrap().extend_from_slice(samples);
        match self.halt_after {
            Some(limit) if seen >= limit => SinkControl::Halt,
            _ => SinkControl::Continue,
        }
    }
}

fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| (i % 30_000) as i16).collect()
}

fn options() -> RecorderOptions {
    RecorderOptions {
        stop_timeout: Duration::from_secs(5),
    }
}

fn recorder(backend: &ReplayBackend, sink: &Arc<CountingSink>) -> Box<dyn Recorder> {
    let sink: Arc<dyn FrameSink> = sink.clone();
    backend.create(sink, options()).unwrap()
}

fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn backend_reports_one_device() {
    let backend = ReplayBackend::from_samples("clip", ramp(10));
    assert_eq!(backend.name(), "replay");
    assert_eq!(backend.input_device_count(), 1);
    assert_eq!(backend.default_input_device(), Some("clip".to_string()));
    assert_eq!(backend.input_device_names(), vec!["clip".to_string()]);
}

#[test]
fn start_requires_ready() {
    let backend = ReplayBackend::from_samples("clip", ramp(1024));
    let sink = Arc::new(CountingSink::default());
    let mut rec = recorder(&backend, &sink);

    assert_eq!(rec.state(), RecorderState::Created);
    assert!(matches!(rec.start(), Err(PipelineError::NotReady(_))));
    assert_eq!(rec.state(), RecorderState::Created);
    assert_eq!(sink.frames(), 0);

    rec.open(None, AudioFormat::SPEECH).unwrap();
    rec.start().unwrap();
    assert!(matches!(rec.start(), Err(PipelineError::NotReady(_))));
    assert_eq!(rec.state(), RecorderState::Recording);
    rec.stop().unwrap();
    assert_eq!(rec.state(), RecorderState::Ready);
}

#[test]
fn stop_requires_recording() {
    let backend = ReplayBackend::from_samples("clip", ramp(1024));
    let sink = Arc::new(CountingSink::default());
    let mut rec = recorder(&backend, &sink);

    assert!(matches!(rec.stop(), Err(PipelineError::NotReady(_))));
    rec.open(None, AudioFormat::SPEECH).unwrap();
    assert!(matches!(rec.stop(), Err(PipelineError::NotReady(_))));
    assert_eq!(rec.state(), RecorderState::Ready);
}

#[test]
fn open_twice_is_already_active() {
    let backend = ReplayBackend::from_samples("clip", ramp(1024));
    let sink = Arc::new(CountingSink::default());
    let mut rec = recorder(&backend, &sink);

    rec.open(None, AudioFormat::SPEECH).unwrap();
    assert!(matches!(
        rec.open(None, AudioFormat::SPEECH),
        Err(PipelineError::AlreadyActive(_))
    ));
}

#[test]
fn open_on_ready_recorder_checks_state_first() {
    let backend = ReplayBackend::from_samples("clip", ramp(1024));
    let sink = Arc::new(CountingSink::default());
    let mut rec = recorder(&backend, &sink);

    rec.open(None, AudioFormat::SPEECH).unwrap();
    assert!(matches!(
        rec.open(Some("other"), AudioFormat::pcm16(44_100, 2)),
        Err(PipelineError::AlreadyActive(_))
    ));
    assert_eq!(rec.state(), RecorderState::Ready);
}

#[test]
fn open_rejects_unknown_device_and_format() {
    let backend = ReplayBackend::from_samples("clip", ramp(1024));
    let sink = Arc::new(CountingSink::default());
    let mut rec = recorder(&backend, &sink);

    assert!(matches!(
        rec.open(Some("other"), AudioFormat::SPEECH),
        Err(PipelineError::DeviceUnavailable(_))
    ));
    assert!(matches!(
        rec.open(None, AudioFormat::pcm16(44_100, 2)),
        Err(PipelineError::InvalidArgument(_))
    ));
    assert_eq!(rec.state(), RecorderState::Created);

    rec.open(Some("clip"), AudioFormat::SPEECH).unwrap();
    assert_eq!(rec.state(), RecorderState::Ready);
}

#[test]
fn unpaced_replay_delivers_whole_clip_in_order() {
    let clip = ramp(5_000);
    let backend = ReplayBackend::from_samples("clip", clip.clone())
        .with_period_frames(1024)
        .with_pacing(Pacing::Unpaced);
    let sink = Arc::new(CountingSink::default());
    let mut rec = recorder(&backend, &sink);

    rec.open(None, AudioFormat::SPEECH).unwrap();
    rec.start().unwrap();
    assert_eq!(rec.state(), RecorderState::Recording);

    wait_until(|| sink.frames() == 5);
    rec.stop().unwrap();
    assert_eq!(rec.state(), RecorderState::Ready);
    assert_eq!(*sink.samples.lock().unwrap(), clip);
}

#[test]
fn no_frames_after_stop_returns() {
    let backend = ReplayBackend::from_samples("clip", ramp(160))
        .with_period_frames(160)
        .with_pacing(Pacing::RealTime)
        .looping(true);
    let sink = Arc::new(CountingSink::default());
    let mut rec = recorder(&backend, &sink);

    rec.open(None, AudioFormat::SPEECH).unwrap();
    rec.start().unwrap();
    wait_until(|| sink.frames() >= 3);

    rec.stop().unwrap();
    let after_stop = sink.frames();
    assert!(rec.is_capture_finished());

    thread::sleep(Duration::from_millis(60));
    assert_eq!(sink.frames(), after_stop);
}

#[test]
fn recorder_restarts_after_stop() {
    let backend = ReplayBackend::from_samples("clip", ramp(2_048))
        .with_period_frames(1024)
        .with_pacing(Pacing::Unpaced);
    let sink = Arc::new(CountingSink::default());
    let mut rec = recorder(&backend, &sink);

    rec.open(None, AudioFormat::SPEECH).unwrap();
    for round in 1..=2 {
        rec.start().unwrap();
        wait_until(|| sink.frames() == round * 2);
        rec.stop().unwrap();
    }
    assert_eq!(rec.state(), RecorderState::Ready);
}

#[test]
fn halt_stops_delivery_until_stop() {
    let backend = ReplayBackend::from_samples("clip", ramp(160))
        .with_period_frames(160)
        .with_pacing(Pacing::Unpaced)
        .looping(true);
    let sink = Arc::new(CountingSink::halting_after(4));
    let mut rec = recorder(&backend, &sink);

    rec.open(None, AudioFormat::SPEECH).unwrap();
    rec.start().unwrap();
    wait_until(|| rec.is_capture_finished());

    thread::sleep(Duration::from_millis(20));
    assert_eq!(sink.frames(), 4);

    // The halted thread is still owned by the recorder until stopped
    assert_eq!(rec.state(), RecorderState::Recording);
    rec.stop().unwrap();
    assert_eq!(rec.state(), RecorderState::Ready);
}

#[test]
fn close_stops_a_recording_recorder() {
    let backend = ReplayBackend::from_samples("clip", ramp(160))
        .with_period_frames(160)
        .looping(true);
    let sink = Arc::new(CountingSink::default());
    let mut rec = recorder(&backend, &sink);

    rec.open(None, AudioFormat::SPEECH).unwrap();
    rec.start().unwrap();
    wait_until(|| sink.frames() >= 1);

    rec.close();
    assert_eq!(rec.state(), RecorderState::Created);
    let after_close = sink.frames();
    thread::sleep(Duration::from_millis(40));
    assert_eq!(sink.frames(), after_close);

    // Idempotent
    rec.close();
    assert_eq!(rec.state(), RecorderState::Created);
}

#[test]
fn replay_from_wav_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    let clip = ramp(3_200);
    wake_capture::domain::audio::write_wav(&path, AudioFormat::SPEECH, &clip).unwrap();

    let backend = ReplayBackend::from_wav(&path).unwrap().with_pacing(Pacing::Unpaced);
    assert_eq!(backend.len(), 3_200);

    let sink = Arc::new(CountingSink::default());
    let mut rec = recorder(&backend, &sink);
    rec.open(None, AudioFormat::SPEECH).unwrap();
    rec.start().unwrap();
    wait_until(|| sink.samples.lock().unwrap().len() == 3_200);
    rec.stop().unwrap();
    assert_eq!(*sink.samples.lock().unwrap(), clip);
}
