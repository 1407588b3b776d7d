//! Recognition protocol value objects

pub mod event;
pub mod protocol;

pub use event::{EndReason, EnginePayload, WakeEvent};
pub use protocol::{
    AudioSource, EngineConfig, StatusMarker, WriteStatus, ESR_ABILITY, IVW_ABILITY,
};
