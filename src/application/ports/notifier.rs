//! Session event notifier port

use std::sync::Arc;

use crate::domain::recognition::{EndReason, EnginePayload};

/// Observer of raw captured frames, called on whichever thread delivers them
pub type CaptureCallback = Arc<dyn Fn(&[i16]) + Send + Sync>;

/// Port for session lifecycle and result notifications.
///
/// Methods may be called from the capture thread. They are never called
/// while session-internal locks are held.
pub trait SessionNotifier: Send + Sync {
    /// The session started listening
    fn on_speech_begin(&self) {}

    /// The session stopped listening on its own
    fn on_speech_end(&self, _reason: EndReason) {}

    /// The engine produced a result
    fn on_result(&self, _payload: &EnginePayload) {}
}

/// Notifier that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpNotifier;

impl SessionNotifier for NoOpNotifier {}
