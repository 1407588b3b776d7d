//! Capture backend selection

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use super::cpal_recorder::CpalBackend;
use super::replay::{Pacing, ReplayBackend};
use crate::application::ports::RecorderBackend;
use crate::domain::error::PipelineError;

/// Available capture backends
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Host audio API through cpal
    #[default]
    Cpal,
    /// Real-time playback of a WAV file
    Replay(PathBuf),
}

/// Error type for parsing a backend name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBackendError {
    pub value: String,
    pub valid_options: &'static str,
}

impl fmt::Display for ParseBackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid backend '{}'. Valid options: {}",
            self.value, self.valid_options
        )
    }
}

impl std::error::Error for ParseBackendError {}

impl FromStr for BackendKind {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("cpal") {
            return Ok(BackendKind::Cpal);
        }
        match trimmed.split_once(':') {
            Some((prefix, path)) if prefix.eq_ignore_ascii_case("replay") && !path.is_empty() => {
                Ok(BackendKind::Replay(PathBuf::from(path)))
            }
            _ => Err(ParseBackendError {
                value: s.to_string(),
                valid_options: "cpal, replay:<file.wav>",
            }),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cpal => write!(f, "cpal"),
            BackendKind::Replay(path) => write!(f, "replay:{}", path.display()),
        }
    }
}

/// Build the backend for `kind`
pub fn create_backend(kind: &BackendKind) -> Result<Arc<dyn RecorderBackend>, PipelineError> {
    debug!(backend = %kind, "creating capture backend");
    match kind {
        BackendKind::Cpal => Ok(Arc::new(CpalBackend::new())),
        BackendKind::Replay(path) => Ok(Arc::new(
            ReplayBackend::from_wav(path)?.with_pacing(Pacing::RealTime),
        )),
    }
}
