//! Engine results and session termination reasons

use std::fmt;

use serde_json::Value;

/// Raw result record read back from the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePayload {
    /// Opaque engine output, JSON for the bundled abilities
    pub text: String,
    /// Engine flagged this as the final result of the utterance
    pub is_last: bool,
}

impl EnginePayload {
    pub fn new(text: impl Into<String>, is_last: bool) -> Self {
        Self {
            text: text.into(),
            is_last,
        }
    }
}

/// Why a session stopped listening on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Engine voice activity detection closed the utterance
    VadDetected,
    /// Engine rejected a frame with this code
    EngineFailure(i32),
}

impl EndReason {
    /// 0 for a VAD end, otherwise the engine's error code
    pub const fn code(&self) -> i32 {
        match self {
            Self::VadDetected => 0,
            Self::EngineFailure(code) => *code,
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::EngineFailure(_))
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VadDetected => write!(f, "speech end detected"),
            Self::EngineFailure(code) => write!(f, "engine error {}", code),
        }
    }
}

/// Keyword hit extracted from a wake-word payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeEvent {
    pub keyword: String,
    pub confidence: i64,
}

impl WakeEvent {
    /// Parse `{"rlt":[{"keyword":..,"score":..}]}`.
    ///
    /// `confidence` is accepted in place of `score`. Returns `None` for
    /// anything that is not a keyword hit.
    pub fn from_payload(payload: &EnginePayload) -> Option<Self> {
        let root: Value = serde_json::from_str(&payload.text).ok()?;
        let first = root.get("rlt")?.as_array()?.first()?;

        let keyword = first
            .get("keyword")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let confidence = first
            .get("score")
            .or_else(|| first.get("confidence"))
            .and_then(Value::as_i64)
            .unwrap_or(0);

        Some(Self {
            keyword,
            confidence,
        })
    }
}
