//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod engine;
pub mod notifier;
pub mod recorder;

// Re-export common types
pub use config::ConfigStore;
pub use engine::{EngineSession, RecognitionEngine};
pub use notifier::{CaptureCallback, NoOpNotifier, SessionNotifier};
pub use recorder::{FrameSink, Recorder, RecorderBackend, RecorderOptions, SinkControl};
