//! Streaming recognition session
//!
//! Maps a sequence of audio frames, captured by a recorder or pushed by the
//! caller, onto the engine's Begin/Continue/End streaming protocol and maps
//! engine signals back onto the session lifecycle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::ports::{
    CaptureCallback, EngineSession, FrameSink, NoOpNotifier, RecognitionEngine, Recorder,
    RecorderBackend, RecorderOptions, SessionNotifier, SinkControl,
};
use crate::domain::audio::AudioFormat;
use crate::domain::error::PipelineError;
use crate::domain::lifecycle::{RecorderState, SessionLifecycle, SessionState};
use crate::domain::recognition::{
    AudioSource, EndReason, EngineConfig, EnginePayload, StatusMarker, WriteStatus,
};

/// Upper bound on results drained from the engine after a single write
const MAX_RESULTS_PER_WRITE: usize = 16;

/// Options fixed for the lifetime of a session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Capture device name; `None` selects the default input
    pub device: Option<String>,
    /// Recorder construction options (stop timeout)
    pub recorder: RecorderOptions,
}

impl SessionOptions {
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.recorder.stop_timeout = timeout;
        self
    }

    pub fn with_device(mut self, device: Option<String>) -> Self {
        self.device = device;
        self
    }
}

/// Engine stream state guarded by the session mutex
struct EngineStream {
    lifecycle: SessionLifecycle,
    handle: Option<Box<dyn EngineSession>>,
}

/// Result of pushing one frame through the engine
enum FrameOutcome {
    Accepted,
    Ended(EndReason),
}

/// State shared between the control side and the capture thread.
///
/// Rebuilt on every `init()` so a recorder's sink never outlives the
/// configuration it was created for.
struct SessionCore {
    engine: Arc<dyn RecognitionEngine>,
    ability_id: String,
    config: EngineConfig,
    source: AudioSource,
    notifier: Arc<dyn SessionNotifier>,
    capture_callback: Option<CaptureCallback>,
    stream: Mutex<EngineStream>,
}

impl SessionCore {
    fn lock(&self) -> MutexGuard<'_, EngineStream> {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> SessionState {
        self.lock().lifecycle.state()
    }

    fn marker(&self) -> StatusMarker {
        self.lock().lifecycle.marker()
    }

    /// INIT -> STARTED with a fresh engine handle
    fn open_stream(&self) -> Result<(), PipelineError> {
        let mut stream = self.lock();
        if stream.lifecycle.is_started() {
            return Err(PipelineError::AlreadyActive(
                "start a started session".to_string(),
            ));
        }

        let handle = self.engine.create(&self.ability_id, &self.config)?;
        stream.handle = Some(handle);
        stream.lifecycle.start()?;
        Ok(())
    }

    /// Drop the engine handle without flushing and return to INIT
    fn abort_stream(&self) {
        let mut stream = self.lock();
        if let Some(mut handle) = stream.handle.take() {
            handle.end();
        }
        stream.lifecycle.stop();
    }

    fn write_frame(&self, samples: &[i16]) -> Result<FrameOutcome, PipelineError> {
        let mut payloads = Vec::new();

        let outcome = {
            let mut stream = self.lock();
            stream.lifecycle.require_started("write audio")?;
            let marker = stream.lifecycle.marker();

            let handle = stream.handle.as_mut().ok_or_else(|| {
                PipelineError::NotReady("write audio without an engine handle".to_string())
            })?;

            let result = handle.write(samples, marker);
            let reason = match result {
                Ok(status) => {
                    drain_results(handle.as_mut(), &mut payloads);
                    match status {
                        WriteStatus::Pending => None,
                        WriteStatus::Terminal => Some(EndReason::VadDetected),
                    }
                }
                Err(e) => Some(EndReason::EngineFailure(e.code)),
            };

            match reason {
                None => {
                    stream.lifecycle.advance();
                    FrameOutcome::Accepted
                }
                Some(reason) => {
                    if let Some(mut handle) = stream.handle.take() {
                        handle.end();
                    }
                    stream.lifecycle.stop();
                    FrameOutcome::Ended(reason)
                }
            }
        };

        for payload in &payloads {
            self.notifier.on_result(payload);
        }
        if let FrameOutcome::Ended(reason) = outcome {
            info!(source = %self.source, %reason, "session terminated by engine");
            self.notifier.on_speech_end(reason);
        }

        Ok(outcome)
    }

    /// Send the closing End frame, collect trailing results and release the
    /// engine. Returns false when the session was not started.
    fn finish_stream(&self) -> bool {
        let mut payloads = Vec::new();

        {
            let mut stream = self.lock();
            if !stream.lifecycle.is_started() {
                return false;
            }

            if let Some(mut handle) = stream.handle.take() {
                match handle.write(&[], StatusMarker::End) {
                    Ok(_) => drain_results(handle.as_mut(), &mut payloads),
                    Err(e) => warn!(code = e.code, "engine rejected end-of-stream frame"),
                }
                handle.end();
            }
            stream.lifecycle.stop();
        }

        for payload in &payloads {
            self.notifier.on_result(payload);
        }
        true
    }
}

fn drain_results(handle: &mut dyn EngineSession, out: &mut Vec<EnginePayload>) {
    for _ in 0..MAX_RESULTS_PER_WRITE {
        match handle.read() {
            Some(payload) => out.push(payload),
            None => break,
        }
    }
}

impl FrameSink for SessionCore {
    fn on_frame(&self, samples: &[i16]) -> SinkControl {
        if samples.is_empty() {
            return SinkControl::Continue;
        }

        if let Some(callback) = &self.capture_callback {
            callback(samples);
        }

        match self.write_frame(samples) {
            Ok(FrameOutcome::Accepted) => SinkControl::Continue,
            Ok(FrameOutcome::Ended(_)) => SinkControl::Halt,
            Err(e) => {
                debug!(error = %e, "dropping captured frame");
                SinkControl::Halt
            }
        }
    }
}

/// Streaming recognition session over one engine and an optional recorder.
///
/// State transitions are driven from a single control thread; only `write`
/// may additionally run on a recorder's capture thread.
pub struct RecognitionSession {
    engine: Arc<dyn RecognitionEngine>,
    backend: Option<Arc<dyn RecorderBackend>>,
    options: SessionOptions,
    notifier: Arc<dyn SessionNotifier>,
    capture_callback: Option<CaptureCallback>,
    core: Option<Arc<SessionCore>>,
    recorder: Option<Box<dyn Recorder>>,
}

impl RecognitionSession {
    /// Create a session that can only take externally pushed frames
    pub fn new(engine: Arc<dyn RecognitionEngine>, options: SessionOptions) -> Self {
        Self {
            engine,
            backend: None,
            options,
            notifier: Arc::new(NoOpNotifier),
            capture_callback: None,
            core: None,
            recorder: None,
        }
    }

    /// Attach the backend used to create recorders for microphone sources
    pub fn with_backend(mut self, backend: Arc<dyn RecorderBackend>) -> Self {
        self.set_backend(backend);
        self
    }

    /// Replace the capture backend. Takes effect at the next `init()`.
    pub fn set_backend(&mut self, backend: Arc<dyn RecorderBackend>) {
        self.backend = Some(backend);
    }

    /// Install the event notifier. Takes effect at the next `init()`.
    pub fn set_notifier(&mut self, notifier: Arc<dyn SessionNotifier>) {
        self.notifier = notifier;
    }

    /// Observe every captured microphone frame. Takes effect at the next `init()`.
    pub fn set_capture_callback(&mut self, callback: Option<CaptureCallback>) {
        self.capture_callback = callback;
    }

    pub fn state(&self) -> SessionState {
        self.core
            .as_ref()
            .map(|core| core.state())
            .unwrap_or_default()
    }

    pub fn is_started(&self) -> bool {
        self.state() == SessionState::Started
    }

    pub fn is_initialized(&self) -> bool {
        self.core.is_some()
    }

    /// Source selected at the last `init()`
    pub fn source(&self) -> Option<AudioSource> {
        self.core.as_ref().map(|core| core.source)
    }

    /// Marker the next frame will carry
    pub fn marker(&self) -> StatusMarker {
        self.core
            .as_ref()
            .map(|core| core.marker())
            .unwrap_or_default()
    }

    pub fn recorder_state(&self) -> Option<RecorderState> {
        self.recorder.as_ref().map(|rec| rec.state())
    }

    /// Configure the engine and, for microphone sources, open a recorder.
    ///
    /// On failure the session is left uninitialized with no recorder.
    pub fn init(
        &mut self,
        keyword_set_size: usize,
        ability_id: &str,
        source: AudioSource,
    ) -> Result<(), PipelineError> {
        if self.is_started() {
            return Err(PipelineError::AlreadyActive(
                "initialize a started session".to_string(),
            ));
        }
        if self.core.is_some() {
            self.uninit();
        }

        let backend = match source {
            AudioSource::Microphone => {
                let backend = self.backend.clone().ok_or_else(|| {
                    PipelineError::InvalidArgument(
                        "microphone source requires a recorder backend".to_string(),
                    )
                })?;
                if backend.input_device_count() == 0 {
                    return Err(PipelineError::InvalidArgument(
                        "no input devices available".to_string(),
                    ));
                }
                Some(backend)
            }
            AudioSource::External => None,
        };

        let config = EngineConfig::new(keyword_set_size);
        self.engine.prepare(ability_id, &config)?;

        let core = Arc::new(SessionCore {
            engine: Arc::clone(&self.engine),
            ability_id: ability_id.to_string(),
            config,
            source,
            notifier: Arc::clone(&self.notifier),
            capture_callback: self.capture_callback.clone(),
            stream: Mutex::new(EngineStream {
                lifecycle: SessionLifecycle::new(),
                handle: None,
            }),
        });

        if let Some(backend) = backend {
            let sink: Arc<dyn FrameSink> = core.clone();
            let mut recorder = backend.create(sink, self.options.recorder)?;
            if let Err(e) = recorder.open(self.options.device.as_deref(), AudioFormat::SPEECH) {
                recorder.close();
                return Err(e);
            }
            debug!(backend = backend.name(), "recorder opened for session");
            self.recorder = Some(recorder);
        }

        info!(ability_id, keyword_set_size, %source, "session initialized");
        self.core = Some(core);
        Ok(())
    }

    /// INIT -> STARTED; starts the recorder for microphone sources.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        let core = self
            .core
            .clone()
            .ok_or_else(|| PipelineError::NotReady("start an uninitialized session".to_string()))?;

        if core.state() == SessionState::Started {
            return Err(PipelineError::AlreadyActive(
                "start a started session".to_string(),
            ));
        }

        self.reap_halted_recorder();
        core.open_stream()?;

        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.start() {
                core.abort_stream();
                warn!(error = %e, "recorder failed to start");
                return Err(PipelineError::RecordFailure(e.to_string()));
            }
        }

        info!(source = %core.source, "session started");
        core.notifier.on_speech_begin();
        Ok(())
    }

    /// Push one frame to the engine.
    ///
    /// A terminal engine status ends the session; the error variant is
    /// returned when the engine failed rather than closing the utterance.
    pub fn write(&self, samples: &[i16]) -> Result<(), PipelineError> {
        let core = self
            .core
            .as_ref()
            .ok_or_else(|| PipelineError::NotReady("write audio before init".to_string()))?;

        if samples.is_empty() {
            return Err(PipelineError::InvalidArgument("empty audio frame".to_string()));
        }

        match core.write_frame(samples)? {
            FrameOutcome::Ended(EndReason::EngineFailure(code)) => {
                Err(PipelineError::EngineFailure(code))
            }
            _ => Ok(()),
        }
    }

    /// STARTED -> INIT, flushing the engine with a final End frame.
    ///
    /// A no-op success when not started.
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        let Some(core) = self.core.clone() else {
            return Ok(());
        };

        if core.state() != SessionState::Started {
            self.reap_halted_recorder();
            return Ok(());
        }

        let recorder_result = match self.recorder.as_mut() {
            Some(recorder) => recorder.stop(),
            None => Ok(()),
        };

        core.finish_stream();
        info!(source = %core.source, "session stopped");

        recorder_result.map_err(|e| match e {
            PipelineError::Timeout(ms) => PipelineError::Timeout(ms),
            other => PipelineError::RecordFailure(other.to_string()),
        })
    }

    /// Release the recorder and engine. Safe to call repeatedly.
    pub fn uninit(&mut self) {
        if let Some(mut recorder) = self.recorder.take() {
            if recorder.state() == RecorderState::Recording {
                if let Err(e) = recorder.stop() {
                    warn!(error = %e, "recorder did not stop cleanly during uninit");
                }
            }
            recorder.close();
        }

        if let Some(core) = self.core.take() {
            core.abort_stream();
            debug!("session uninitialized");
        }
    }

    /// Join a capture thread that stopped delivering after an engine
    /// terminal status, returning the recorder to READY.
    fn reap_halted_recorder(&mut self) {
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };
        if recorder.state() == RecorderState::Recording {
            debug!("reaping capture thread halted by the engine");
            if let Err(e) = recorder.stop() {
                warn!(error = %e, "failed to reap halted recorder");
            }
        }
    }
}

impl Drop for RecognitionSession {
    fn drop(&mut self) {
        self.uninit();
    }
}
