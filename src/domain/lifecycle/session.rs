//! Recognition session state machine

use std::fmt;

use crate::domain::error::PipelineError;
use crate::domain::recognition::StatusMarker;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Init,
    Started,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Started => "started",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session state plus the streaming position inside the current utterance.
///
/// State machine:
///   INIT -> STARTED (start, marker reset to Begin)
///   STARTED -> INIT (stop / terminate)
///
/// The marker moves Begin -> Continue after the first accepted frame and
/// stays there until the session leaves STARTED.
#[derive(Debug, Default)]
pub struct SessionLifecycle {
    state: SessionState,
    marker: StatusMarker,
}

impl SessionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.state == SessionState::Started
    }

    /// Marker to attach to the next frame
    pub fn marker(&self) -> StatusMarker {
        self.marker
    }

    /// Transition from INIT to STARTED
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.state == SessionState::Started {
            return Err(PipelineError::AlreadyActive("start a started session".to_string()));
        }
        self.state = SessionState::Started;
        self.marker = StatusMarker::Begin;
        Ok(())
    }

    /// Reject `action` unless STARTED
    pub fn require_started(&self, action: &str) -> Result<(), PipelineError> {
        if self.state != SessionState::Started {
            return Err(PipelineError::NotReady(format!("{} while {}", action, self.state)));
        }
        Ok(())
    }

    /// Record that a frame was accepted by the engine
    pub fn advance(&mut self) {
        if self.marker == StatusMarker::Begin {
            self.marker = StatusMarker::Continue;
        }
    }

    /// Return to INIT. Returns false when the session was not started.
    pub fn stop(&mut self) -> bool {
        let was_started = self.state == SessionState::Started;
        self.state = SessionState::Init;
        self.marker = StatusMarker::Begin;
        was_started
    }
}
