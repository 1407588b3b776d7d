//! Recognition engine adapters

mod logging;

pub use logging::{LoggingEngine, TrafficStats};
