//! Application layer - Session orchestration and port interfaces
//!
//! Contains the recognition session, the detector facade built on it,
//! and trait definitions for the engine, recorders and config storage.

pub mod detector;
pub mod ports;
pub mod session;

// Re-export use cases
pub use detector::{DetectorCallback, DetectorConfig, DetectorEvent, WakeDetector};
pub use session::{RecognitionSession, SessionOptions};
