//! Recorder lifecycle state machine

use std::fmt;

use crate::domain::error::PipelineError;

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Created,
    Ready,
    Recording,
    Stopping,
}

impl RecorderState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Ready => "ready",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Guarded recorder state.
///
/// State machine:
///   CREATED -> READY (open)
///   READY -> RECORDING (start)
///   RECORDING -> STOPPING (begin_stop)
///   STOPPING -> READY (finish_stop)
///   CREATED | READY | STOPPING -> CREATED (close)
///
/// A rejected transition leaves the state untouched.
#[derive(Debug, Default)]
pub struct RecorderLifecycle {
    state: RecorderState,
}

impl RecorderLifecycle {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Created,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Transition from CREATED to READY
    pub fn open(&mut self) -> Result<(), PipelineError> {
        if self.state != RecorderState::Created {
            return Err(PipelineError::AlreadyActive(format!(
                "open recorder while {}",
                self.state
            )));
        }
        self.state = RecorderState::Ready;
        Ok(())
    }

    /// Transition from READY to RECORDING
    pub fn start(&mut self) -> Result<(), PipelineError> {
        self.expect(RecorderState::Ready, "start recording")?;
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Transition from RECORDING to STOPPING
    pub fn begin_stop(&mut self) -> Result<(), PipelineError> {
        self.expect(RecorderState::Recording, "stop recording")?;
        self.state = RecorderState::Stopping;
        Ok(())
    }

    /// Transition from STOPPING to READY once the capture thread has exited
    pub fn finish_stop(&mut self) -> Result<(), PipelineError> {
        self.expect(RecorderState::Stopping, "finish stopping")?;
        self.state = RecorderState::Ready;
        Ok(())
    }

    /// Return to CREATED. A recording recorder must be stopped first.
    pub fn close(&mut self) -> Result<(), PipelineError> {
        if self.state == RecorderState::Recording {
            return Err(PipelineError::NotReady(
                "close recorder while recording".to_string(),
            ));
        }
        self.state = RecorderState::Created;
        Ok(())
    }

    fn expect(&self, required: RecorderState, action: &str) -> Result<(), PipelineError> {
        if self.state != required {
            return Err(PipelineError::NotReady(format!(
                "{} while {}",
                action, self.state
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lifecycle_is_created() {
        assert_eq!(RecorderLifecycle::new().state(), RecorderState::Created);
    }

    #[test]
    fn full_cycle() {
        let mut rec = RecorderLifecycle::new();
        rec.open().unwrap();
        assert_eq!(rec.state(), RecorderState::Ready);

        rec.start().unwrap();
        assert_eq!(rec.state(), RecorderState::Recording);

        rec.begin_stop().unwrap();
        assert_eq!(rec.state(), RecorderState::Stopping);

        rec.finish_stop().unwrap();
        assert_eq!(rec.state(), RecorderState::Ready);

        // Can record again without reopening
        rec.start().unwrap();
        rec.begin_stop().unwrap();
        rec.finish_stop().unwrap();

        rec.close().unwrap();
        assert_eq!(rec.state(), RecorderState::Created);
    }

    #[test]
    fn open_twice_is_already_active() {
        let mut rec = RecorderLifecycle::new();
        rec.open().unwrap();
        let err = rec.open().unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyActive(_)));
        assert_eq!(rec.state(), RecorderState::Ready);
    }

    #[test]
    fn start_requires_ready() {
        let mut rec = RecorderLifecycle::new();
        let err = rec.start().unwrap_err();
        assert!(matches!(err, PipelineError::NotReady(_)));
        assert_eq!(rec.state(), RecorderState::Created);

        rec.open().unwrap();
        rec.start().unwrap();
        let err = rec.start().unwrap_err();
        assert!(matches!(err, PipelineError::NotReady(_)));
        assert_eq!(rec.state(), RecorderState::Recording);
    }

    #[test]
    fn stop_requires_recording() {
        let mut rec = RecorderLifecycle::new();
        rec.open().unwrap();
        let err = rec.begin_stop().unwrap_err();
        assert!(matches!(err, PipelineError::NotReady(_)));
        assert_eq!(rec.state(), RecorderState::Ready);
    }

    #[test]
    fn close_rejected_while_recording() {
        let mut rec = RecorderLifecycle::new();
        rec.open().unwrap();
        rec.start().unwrap();
        assert!(rec.close().is_err());
        assert_eq!(rec.state(), RecorderState::Recording);
    }

    #[test]
    fn close_is_idempotent() {
        let mut rec = RecorderLifecycle::new();
        rec.close().unwrap();
        rec.close().unwrap();
        assert_eq!(rec.state(), RecorderState::Created);
    }

    #[test]
    fn state_display() {
        assert_eq!(RecorderState::Created.to_string(), "created");
        assert_eq!(RecorderState::Stopping.to_string(), "stopping");
    }
}
