//! Wake-word detector facade
//!
//! Owns one recognition session and one ring buffer and exposes the
//! start/stop/feed surface used by the CLI.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::ports::{CaptureCallback, RecognitionEngine, RecorderBackend, SessionNotifier};
use super::session::{RecognitionSession, SessionOptions};
use crate::domain::audio::{AudioFormat, AudioRingBuffer};
use crate::domain::config::AppConfig;
use crate::domain::error::PipelineError;
use crate::domain::recognition::{AudioSource, EndReason, EnginePayload, WakeEvent, IVW_ABILITY};
use crate::domain::recording::Duration;

/// Detector settings resolved from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    pub ability_id: String,
    pub keyword_set_size: usize,
    pub buffer_duration: Duration,
    pub stop_timeout: Duration,
    pub device: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ability_id: IVW_ABILITY.to_string(),
            keyword_set_size: 1,
            buffer_duration: Duration::default_buffer(),
            stop_timeout: Duration::default_stop_timeout(),
            device: None,
        }
    }
}

impl DetectorConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            ability_id: config.ability_id_or_default().to_string(),
            keyword_set_size: config.keyword_count_or_default(),
            buffer_duration: config.buffer_duration_or_default(),
            stop_timeout: config.stop_timeout_or_default(),
            device: config.device.clone(),
        }
    }
}

/// Event delivered to the detector callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorEvent {
    /// The session started listening
    Listening,
    /// The engine produced a result; `wake` is set for keyword hits
    Result {
        payload: EnginePayload,
        wake: Option<WakeEvent>,
    },
    /// The session ended without a `stop()` call
    Ended(EndReason),
}

pub type DetectorCallback = Arc<dyn Fn(&DetectorEvent) + Send + Sync>;

struct CallbackNotifier {
    callback: DetectorCallback,
}

impl SessionNotifier for CallbackNotifier {
    fn on_speech_begin(&self) {
        (self.callback)(&DetectorEvent::Listening);
    }

    fn on_speech_end(&self, reason: EndReason) {
        (self.callback)(&DetectorEvent::Ended(reason));
    }

    fn on_result(&self, payload: &EnginePayload) {
        let wake = WakeEvent::from_payload(payload);
        if let Some(hit) = &wake {
            info!(keyword = %hit.keyword, confidence = hit.confidence, "wake word detected");
        }
        (self.callback)(&DetectorEvent::Result {
            payload: payload.clone(),
            wake,
        });
    }
}

/// Single-session wake-word detector with a rolling audio history.
pub struct WakeDetector {
    session: RecognitionSession,
    ring: Arc<AudioRingBuffer>,
    config: DetectorConfig,
    capture_callback: Option<CaptureCallback>,
    running: bool,
}

impl WakeDetector {
    /// Create a detector fed only through `process_audio`
    pub fn new(engine: Arc<dyn RecognitionEngine>, config: DetectorConfig) -> Self {
        let options = SessionOptions::default()
            .with_device(config.device.clone())
            .with_stop_timeout(config.stop_timeout.as_std());
        let session = RecognitionSession::new(engine, options);
        let capacity = AudioFormat::SPEECH.samples_for_millis(config.buffer_duration.as_millis());
        let ring = Arc::new(AudioRingBuffer::with_capacity(AudioFormat::SPEECH, capacity));

        Self {
            session,
            ring,
            config,
            capture_callback: None,
            running: false,
        }
    }

    /// Attach the capture backend used by `start_with_microphone`
    pub fn with_backend(mut self, backend: Arc<dyn RecorderBackend>) -> Self {
        self.session.set_backend(backend);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Receive session events. Must be set before `start`.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: Fn(&DetectorEvent) + Send + Sync + 'static,
    {
        self.session.set_notifier(Arc::new(CallbackNotifier {
            callback: Arc::new(callback),
        }));
    }

    /// Observe every frame entering the ring buffer. Must be set before `start`.
    pub fn set_capture_callback<F>(&mut self, callback: F)
    where
        F: Fn(&[i16]) + Send + Sync + 'static,
    {
        self.capture_callback = Some(Arc::new(callback));
    }

    /// Start a session fed through `process_audio`
    pub fn start(&mut self) -> Result<(), PipelineError> {
        self.begin(AudioSource::External)
    }

    /// Start a session fed by the configured capture device
    pub fn start_with_microphone(&mut self) -> Result<(), PipelineError> {
        self.begin(AudioSource::Microphone)
    }

    fn begin(&mut self, source: AudioSource) -> Result<(), PipelineError> {
        if self.is_running() {
            return Err(PipelineError::AlreadyActive(
                "start a running detector".to_string(),
            ));
        }
        if self.running {
            debug!("previous session ended on its own, releasing it");
            if let Err(e) = self.session.stop() {
                warn!(error = %e, "failed to stop ended session");
            }
            self.running = false;
        }

        let tap = match source {
            AudioSource::Microphone => {
                let ring = Arc::clone(&self.ring);
                let user = self.capture_callback.clone();
                let tap: CaptureCallback = Arc::new(move |samples: &[i16]| {
                    ring.add_samples(samples);
                    if let Some(callback) = &user {
                        callback(samples);
                    }
                });
                Some(tap)
            }
            AudioSource::External => None,
        };
        self.session.set_capture_callback(tap);

        self.session
            .init(self.config.keyword_set_size, &self.config.ability_id, source)?;
        if let Err(e) = self.session.start() {
            self.session.uninit();
            return Err(e);
        }

        self.running = true;
        info!(%source, ability_id = %self.config.ability_id, "detector running");
        Ok(())
    }

    /// Stop the running session and release it. A no-op when not running.
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        if !self.running {
            return Ok(());
        }

        self.session.stop()?;
        self.session.uninit();
        self.running = false;
        info!("detector stopped");
        Ok(())
    }

    /// True while a session is running and has not ended on its own
    pub fn is_running(&self) -> bool {
        self.running && self.session.is_started()
    }

    /// Feed one caller-supplied frame to the history and the engine
    pub fn process_audio(&self, samples: &[i16]) -> Result<(), PipelineError> {
        if !self.is_running() {
            return Err(PipelineError::NotReady(
                "process audio while stopped".to_string(),
            ));
        }

        if samples.is_empty() {
            return Err(PipelineError::InvalidArgument("empty audio frame".to_string()));
        }

        self.ring.add_samples(samples);
        if let Some(callback) = &self.capture_callback {
            callback(samples);
        }
        self.session.write(samples)
    }

    /// Shared handle to the rolling audio history
    pub fn ring_buffer(&self) -> Arc<AudioRingBuffer> {
        Arc::clone(&self.ring)
    }

    pub fn last_audio(&self, millis: u64) -> Vec<i16> {
        self.ring.get_last_audio(millis)
    }

    /// Write the most recent `millis` of history to `path`; returns the
    /// number of samples written.
    pub fn save_last_audio(&self, millis: u64, path: impl AsRef<Path>) -> Result<usize, PipelineError> {
        let samples = self.ring.get_last_audio(millis);
        self.ring.save_to_wav(&samples, path)?;
        Ok(samples.len())
    }
}

impl Drop for WakeDetector {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "detector did not stop cleanly");
        }
    }
}
