//! Streaming protocol between a session and the recognition engine

use std::fmt;
use std::str::FromStr;

use crate::domain::audio::AudioFormat;

/// Wake-word (keyword spotting) ability
pub const IVW_ABILITY: &str = "e867a88f2";

/// Command-word (grammar) recognition ability
pub const ESR_ABILITY: &str = "e75f07b62";

/// Position of a frame inside one logical utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusMarker {
    #[default]
    Begin,
    Continue,
    End,
}

impl StatusMarker {
    /// Numeric status used on the engine wire
    pub const fn code(&self) -> u8 {
        match self {
            Self::Begin => 0,
            Self::Continue => 1,
            Self::End => 2,
        }
    }
}

impl fmt::Display for StatusMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Begin => "begin",
            Self::Continue => "continue",
            Self::End => "end",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of writing one frame to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Frame accepted, utterance still open
    Pending,
    /// Engine detected the end of the utterance
    Terminal,
}

/// Where a session's audio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioSource {
    /// A recorder owned by the session
    Microphone,
    /// Frames pushed by the caller
    External,
}

impl AudioSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Microphone => "microphone",
            Self::External => "external",
        }
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AudioSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "microphone" | "mic" => Ok(Self::Microphone),
            "external" | "user" => Ok(Self::External),
            other => Err(format!("unknown audio source '{}'", other)),
        }
    }
}

/// Engine creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of keyword (or grammar) entries to activate, indices 0..n
    pub keyword_set_size: usize,
    /// Frame format the engine will receive
    pub format: AudioFormat,
}

impl EngineConfig {
    pub fn new(keyword_set_size: usize) -> Self {
        Self {
            keyword_set_size,
            format: AudioFormat::SPEECH,
        }
    }

    /// Keyword indices selected for this session
    pub fn keyword_indices(&self) -> Vec<usize> {
        (0..self.keyword_set_size).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_codes() {
        assert_eq!(StatusMarker::Begin.code(), 0);
        assert_eq!(StatusMarker::Continue.code(), 1);
        assert_eq!(StatusMarker::End.code(), 2);
        assert_eq!(StatusMarker::default(), StatusMarker::Begin);
    }

    #[test]
    fn audio_source_parses() {
        assert_eq!("mic".parse::<AudioSource>(), Ok(AudioSource::Microphone));
        assert_eq!("External".parse::<AudioSource>(), Ok(AudioSource::External));
        assert!("speaker".parse::<AudioSource>().is_err());
    }

    #[test]
    fn keyword_indices_cover_set() {
        assert_eq!(EngineConfig::new(3).keyword_indices(), vec![0, 1, 2]);
        assert!(EngineConfig::new(0).keyword_indices().is_empty());
    }
}
