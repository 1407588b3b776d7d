//! Recognition engine port interface

use crate::domain::error::EngineError;
use crate::domain::recognition::{EngineConfig, EnginePayload, StatusMarker, WriteStatus};

/// Port for the streaming recognition engine.
pub trait RecognitionEngine: Send + Sync {
    /// Select the keyword (or grammar) set for `ability_id`.
    ///
    /// Called once per session init, before any engine session exists.
    fn prepare(&self, ability_id: &str, config: &EngineConfig) -> Result<(), EngineError>;

    /// Open a streaming session. Dropping the returned handle destroys it.
    fn create(
        &self,
        ability_id: &str,
        config: &EngineConfig,
    ) -> Result<Box<dyn EngineSession>, EngineError>;
}

/// One open engine stream for a single utterance sequence
pub trait EngineSession: Send {
    /// Feed a frame tagged with its position in the utterance.
    ///
    /// `Err` is a hard engine failure and ends the session.
    fn write(&mut self, samples: &[i16], marker: StatusMarker) -> Result<WriteStatus, EngineError>;

    /// Take the next available result, if any
    fn read(&mut self) -> Option<EnginePayload>;

    /// Close the stream. Further writes are invalid.
    fn end(&mut self);
}
