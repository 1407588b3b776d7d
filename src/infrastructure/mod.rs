//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with audio hosts, engines and the filesystem.

pub mod config;
pub mod engine;
pub mod recording;

// Re-export adapters
pub use config::XdgConfigStore;
pub use engine::LoggingEngine;
pub use recording::{create_backend, BackendKind, CpalBackend, ReplayBackend};
