//! wake-capture - wake-word audio capture pipeline
//!
//! This crate captures microphone (or caller-supplied) audio, keeps a
//! rolling history of it, and streams it to a wake-word / command
//! recognition engine through a small session state machine.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Ring buffer, audio format, lifecycle state machines, errors
//! - **Application**: Recognition session, detector facade, port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, replay, logging engine, XDG config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
