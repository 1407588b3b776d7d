//! Scripted engine and faulty recorders shared by the session and detector tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use wake_capture::application::ports::{
    EngineSession, FrameSink, RecognitionEngine, Recorder, RecorderBackend, RecorderOptions,
};
use wake_capture::domain::audio::AudioFormat;
use wake_capture::domain::error::{EngineError, PipelineError};
use wake_capture::domain::lifecycle::RecorderState;
use wake_capture::domain::recognition::{EngineConfig, EnginePayload, StatusMarker, WriteStatus};
use wake_capture::infrastructure::recording::{CaptureSlot, CaptureThread};

/// Wake-word result the engine reports as a keyword hit
pub const WAKE_PAYLOAD: &str = r#"{"rlt":[{"keyword":"hello","score":1500}]}"#;

/// What the engine does on its n-th data frame (1-based, per session)
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub terminal_at: Option<usize>,
    pub fail_at: Option<(usize, i32)>,
    pub payload_at: Option<(usize, String)>,
    pub final_payload: Option<String>,
    pub prepare_error: Option<i32>,
}

/// Everything the engine observed, shared across its sessions
#[derive(Debug, Default)]
pub struct Journal {
    pub writes: AtomicUsize,
    pub created: AtomicUsize,
    pub ended: AtomicUsize,
    pub markers: Mutex<Vec<StatusMarker>>,
}

impl Journal {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn ended(&self) -> usize {
        self.ended.load(Ordering::SeqCst)
    }

    pub fn markers(&self) -> Vec<StatusMarker> {
        self.markers.lock().unwrap().clone()
    }
}

pub struct ScriptedEngine {
    script: Script,
    journal: Arc<Journal>,
}

impl ScriptedEngine {
    pub fn new(script: Script) -> (Arc<Self>, Arc<Journal>) {
        let journal = Arc::new(Journal::default());
        let engine = Arc::new(Self {
            script,
            journal: Arc::clone(&journal),
        });
        (engine, journal)
    }

    pub fn pending() -> (Arc<Self>, Arc<Journal>) {
        Self::new(Script::default())
    }
}

impl RecognitionEngine for ScriptedEngine {
    fn prepare(&self, _ability_id: &str, _config: &EngineConfig) -> Result<(), EngineError> {
        match self.script.prepare_error {
            Some(code) => Err(EngineError::new(code)),
            None => Ok(()),
        }
    }

    fn create(
        &self,
        _ability_id: &str,
        _config: &EngineConfig,
    ) -> Result<Box<dyn EngineSession>, EngineError> {
        self.journal.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            journal: Arc::clone(&self.journal),
            frames: 0,
            queued: Vec::new(),
        }))
    }
}

struct ScriptedSession {
    script: Script,
    journal: Arc<Journal>,
    frames: usize,
    queued: Vec<EnginePayload>,
}

impl EngineSession for ScriptedSession {
    fn write(&mut self, _samples: &[i16], marker: StatusMarker) -> Result<WriteStatus, EngineError> {
        self.journal.writes.fetch_add(1, Ordering::SeqCst);
        self.journal.markers.lock().unwrap().push(marker);

        if marker == StatusMarker::End {
            if let Some(text) = &self.script.final_payload {
                self.queued.push(EnginePayload::new(text.clone(), true));
            }
            return Ok(WriteStatus::Pending);
        }

        self.frames += 1;
        if let Some((n, text)) = &self.script.payload_at {
            if *n == self.frames {
                self.queued.push(EnginePayload::new(text.clone(), false));
            }
        }
        if let Some((n, code)) = self.script.fail_at {
            if n == self.frames {
                return Err(EngineError::new(code));
            }
        }
        if self.script.terminal_at == Some(self.frames) {
            return Ok(WriteStatus::Terminal);
        }
        Ok(WriteStatus::Pending)
    }

    fn read(&mut self) -> Option<EnginePayload> {
        if self.queued.is_empty() {
            None
        } else {
            Some(self.queued.remove(0))
        }
    }

    fn end(&mut self) {
        self.journal.ended.fetch_add(1, Ordering::SeqCst);
    }
}

/// Poll `condition` for up to five seconds
pub fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}

/// One 10 ms frame of 16 kHz audio
pub fn frame(value: i16) -> Vec<i16> {
    vec![value; 160]
}

/// How a `FaultyBackend` recorder misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `start()` fails without spawning a capture thread
    StartFails,
    /// The capture thread ignores stop requests for this long
    IgnoresStop(Duration),
}

/// Backend handing out recorders that fail in a scripted way
pub struct FaultyBackend {
    pub fault: Fault,
}

impl FaultyBackend {
    pub fn new(fault: Fault) -> Arc<dyn RecorderBackend> {
        Arc::new(Self { fault })
    }
}

impl RecorderBackend for FaultyBackend {
    fn name(&self) -> &str {
        "faulty"
    }

    fn input_device_count(&self) -> usize {
        1
    }

    fn default_input_device(&self) -> Option<String> {
        Some("faulty".to_string())
    }

    fn input_device_names(&self) -> Vec<String> {
        vec!["faulty".to_string()]
    }

    fn create(
        &self,
        _sink: Arc<dyn FrameSink>,
        options: RecorderOptions,
    ) -> Result<Box<dyn Recorder>, PipelineError> {
        Ok(Box::new(FaultyRecorder {
            fault: self.fault,
            slot: CaptureSlot::new(options.stop_timeout),
        }))
    }
}

struct FaultyRecorder {
    fault: Fault,
    slot: CaptureSlot,
}

impl Recorder for FaultyRecorder {
    fn open(&mut self, _device: Option<&str>, _format: AudioFormat) -> Result<(), PipelineError> {
        self.slot.open()
    }

    fn start(&mut self) -> Result<(), PipelineError> {
        self.slot.check_startable()?;
        match self.fault {
            Fault::StartFails => Err(PipelineError::DeviceUnavailable("unplugged".to_string())),
            Fault::IgnoresStop(busy) => {
                let thread = CaptureThread::spawn("stuck-capture", move |_| thread::sleep(busy))?;
                self.slot.begin(thread)
            }
        }
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
