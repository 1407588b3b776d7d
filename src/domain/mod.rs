//! Domain layer - Core pipeline logic
//!
//! Contains value objects, state machines, the ring buffer and domain errors.
//! Nothing here touches audio hardware or the recognition engine.

pub mod audio;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod recognition;
pub mod recording;

// Re-export common types
pub use audio::{AudioFormat, AudioRingBuffer};
pub use config::AppConfig;
pub use error::*;
pub use lifecycle::{RecorderLifecycle, RecorderState, SessionLifecycle, SessionState};
pub use recognition::{
    AudioSource, EndReason, EngineConfig, EnginePayload, StatusMarker, WakeEvent, WriteStatus,
};
pub use recording::Duration;
