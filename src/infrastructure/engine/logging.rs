//! Engine adapter used when no recognition SDK is linked
//!
//! Accepts every frame, logs traffic and never produces a result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::ports::{EngineSession, RecognitionEngine};
use crate::domain::error::EngineError;
use crate::domain::recognition::{EngineConfig, EnginePayload, StatusMarker, WriteStatus};

/// Running totals shared by every session of one engine
#[derive(Debug, Default)]
pub struct TrafficStats {
    frames: AtomicU64,
    bytes: AtomicU64,
    sessions: AtomicU64,
}

impl TrafficStats {
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn sessions(&self) -> u64 {
        self.sessions.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoggingEngine {
    stats: Arc<TrafficStats>,
}

impl LoggingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Arc<TrafficStats> {
        Arc::clone(&self.stats)
    }
}

impl RecognitionEngine for LoggingEngine {
    fn prepare(&self, ability_id: &str, config: &EngineConfig) -> Result<(), EngineError> {
        info!(
            ability_id,
            keywords = ?config.keyword_indices(),
            "no recognition engine linked, logging audio only"
        );
        Ok(())
    }

    fn create(
        &self,
        ability_id: &str,
        _config: &EngineConfig,
    ) -> Result<Box<dyn EngineSession>, EngineError> {
        self.stats.sessions.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(LoggingSession {
            ability_id: ability_id.to_string(),
            stats: Arc::clone(&self.stats),
            frames: 0,
            bytes: 0,
        }))
    }
}

struct LoggingSession {
    ability_id: String,
    stats: Arc<TrafficStats>,
    frames: u64,
    bytes: u64,
}

impl EngineSession for LoggingSession {
    fn write(&mut self, samples: &[i16], marker: StatusMarker) -> Result<WriteStatus, EngineError> {
        let bytes = (samples.len() * std::mem::size_of::<i16>()) as u64;
        self.frames += 1;
        self.bytes += bytes;
        self.stats.frames.fetch_add(1, Ordering::Relaxed);
        self.stats.bytes.fetch_add(bytes, Ordering::Relaxed);

        debug!(%marker, bytes, "audio written");
        Ok(WriteStatus::Pending)
    }

    fn read(&mut self) -> Option<EnginePayload> {
        None
    }

    fn end(&mut self) {
        info!(
            ability_id = %self.ability_id,
            frames = self.frames,
            bytes = self.bytes,
            "engine session ended"
        );
    }
}
