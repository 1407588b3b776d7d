//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>ms, <number>s, <number>m, or <number>m<number>s (e.g., 500ms, 30s, 1m, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Opaque failure code reported by the recognition engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine error code {code}")]
pub struct EngineError {
    pub code: i32,
}

impl EngineError {
    pub const fn new(code: i32) -> Self {
        Self { code }
    }
}

/// Errors produced by the capture pipeline.
///
/// Every recorder, session and detector operation reports one of these
/// instead of panicking across the capture/control thread boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Audio subsystem could not be initialized: {0}")]
    AllocationFailure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Already active: cannot {0}")]
    AlreadyActive(String),

    #[error("Not ready: cannot {0}")]
    NotReady(String),

    #[error("Recording failed: {0}")]
    RecordFailure(String),

    #[error("Recognition engine failed with code {0}")]
    EngineFailure(i32),

    #[error("Timed out after {0} ms waiting for the capture thread to stop")]
    Timeout(u64),

    #[error("WAV export failed: {0}")]
    Wav(String),
}

impl From<EngineError> for PipelineError {
    fn from(err: EngineError) -> Self {
        Self::EngineFailure(err.code)
    }
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
