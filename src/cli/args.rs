//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::recording::Duration;

/// wake-capture - wake-word audio capture pipeline
#[derive(Parser, Debug)]
#[command(name = "wake-capture")]
#[command(version)]
#[command(about = "Capture microphone audio and stream it to a wake-word engine")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List audio input devices
    Devices,
    /// Listen on the microphone (or a replayed WAV file)
    Listen(ListenArgs),
    /// Push a WAV file through the detector as external audio
    Feed(FeedArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by commands that can export the audio history
#[derive(Args, Debug, Clone, Default)]
pub struct SaveArgs {
    /// Write the most recent audio to this WAV file when done
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Length of audio to save (e.g., 3s, 1500ms); defaults to the whole buffer
    #[arg(long, value_name = "TIME", requires = "save")]
    pub window: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    /// How long to listen (e.g., 10s, 1m, 2m30s)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Input device name
    #[arg(long, value_name = "NAME", conflicts_with = "replay")]
    pub device: Option<String>,

    /// Replay a WAV file instead of capturing from a device
    #[arg(long, value_name = "WAV")]
    pub replay: Option<PathBuf>,

    #[command(flatten)]
    pub export: SaveArgs,
}

#[derive(Args, Debug, Clone)]
pub struct FeedArgs {
    /// 16-bit PCM WAV file to feed
    pub input: PathBuf,

    /// Frame length in milliseconds
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_FRAME_MS)]
    pub frame_ms: u64,

    #[command(flatten)]
    pub export: SaveArgs,
}

/// Default frame length for `feed`, matching one capture period
pub const DEFAULT_FRAME_MS: u64 = 64;

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed listen options
#[derive(Debug, Clone)]
pub struct ListenOptions {
    pub duration: Duration,
    pub replay: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub window: Option<Duration>,
}

/// Parsed feed options
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub input: PathBuf,
    pub frame_ms: u64,
    pub save: Option<PathBuf>,
    pub window: Option<Duration>,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "ability_id",
    "keyword_count",
    "buffer_duration",
    "stop_timeout",
    "device",
    "backend",
    "log_level",
];

/// Valid log level values
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
