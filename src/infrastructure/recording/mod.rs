//! Recording infrastructure module
//!
//! Provides capture backends behind the recorder port: cpal for live
//! microphones and a replay backend for prerecorded clips. Both deliver
//! 16kHz mono frames from a dedicated capture thread.

mod capture_thread;
mod convert;
mod cpal_recorder;
mod factory;
mod replay;

pub use capture_thread::{CaptureControl, CaptureSlot, CaptureThread};
pub use convert::{downmix, FrameConverter};
pub use cpal_recorder::{CpalBackend, CpalRecorder};
pub use factory::{create_backend, BackendKind, ParseBackendError};
pub use replay::{Pacing, ReplayBackend, ReplayRecorder, DEFAULT_PERIOD_FRAMES};
