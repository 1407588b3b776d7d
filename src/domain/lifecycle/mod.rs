//! Lifecycle state machines for recorders and recognition sessions

pub mod recorder;
pub mod session;

pub use recorder::{RecorderLifecycle, RecorderState};
pub use session::{SessionLifecycle, SessionState};
