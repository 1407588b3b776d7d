//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recognition::IVW_ABILITY;
use crate::domain::recording::Duration;

/// Backend used when none is configured
pub const DEFAULT_BACKEND: &str = "cpal";

/// Log filter used when none is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub ability_id: Option<String>,
    pub keyword_count: Option<usize>,
    pub buffer_duration: Option<String>,
    pub stop_timeout: Option<String>,
    pub device: Option<String>,
    pub backend: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            ability_id: Some(IVW_ABILITY.to_string()),
            keyword_count: Some(1),
            buffer_duration: Some(Duration::default_buffer().to_string()),
            stop_timeout: Some(Duration::default_stop_timeout().to_string()),
            device: None,
            backend: Some(DEFAULT_BACKEND.to_string()),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            ability_id: other.ability_id.or(self.ability_id),
            keyword_count: other.keyword_count.or(self.keyword_count),
            buffer_duration: other.buffer_duration.or(self.buffer_duration),
            stop_timeout: other.stop_timeout.or(self.stop_timeout),
            device: other.device.or(self.device),
            backend: other.backend.or(self.backend),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Get ability id, or the wake-word ability if not set
    pub fn ability_id_or_default(&self) -> &str {
        self.ability_id.as_deref().unwrap_or(IVW_ABILITY)
    }

    /// Get keyword count, or 1 if not set
    pub fn keyword_count_or_default(&self) -> usize {
        self.keyword_count.unwrap_or(1)
    }

    /// Get ring buffer history as parsed Duration, or default if not set/invalid
    pub fn buffer_duration_or_default(&self) -> Duration {
        self.buffer_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_buffer)
    }

    /// Get stop timeout as parsed Duration, or default if not set/invalid
    pub fn stop_timeout_or_default(&self) -> Duration {
        self.stop_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_stop_timeout)
    }

    /// Get backend name, or "cpal" if not set
    pub fn backend_or_default(&self) -> &str {
        self.backend.as_deref().unwrap_or(DEFAULT_BACKEND)
    }

    /// Get log filter, or "info" if not set
    pub fn log_level_or_default(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.ability_id, Some("e867a88f2".to_string()));
        assert_eq!(config.keyword_count, Some(1));
        assert_eq!(config.buffer_duration, Some("10s".to_string()));
        assert_eq!(config.stop_timeout, Some("1m".to_string()));
        assert!(config.device.is_none());
        assert_eq!(config.backend, Some("cpal".to_string()));
        assert_eq!(config.log_level, Some("info".to_string()));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.ability_id.is_none());
        assert!(config.keyword_count.is_none());
        assert!(config.stop_timeout.is_none());
        assert!(config.backend.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            device: Some("built-in".to_string()),
            keyword_count: Some(1),
            backend: Some("cpal".to_string()),
            ..Default::default()
        };

        let other = AppConfig {
            device: Some("usb".to_string()),
            keyword_count: None,
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.device, Some("usb".to_string()));
        assert_eq!(merged.keyword_count, Some(1));
        assert_eq!(merged.backend, Some("cpal".to_string()));
    }

    #[test]
    fn durations_fall_back_on_invalid() {
        let config = AppConfig {
            buffer_duration: Some("forever".to_string()),
            stop_timeout: Some("5s".to_string()),
            ..Default::default()
        };
        assert_eq!(config.buffer_duration_or_default().as_secs(), 10);
        assert_eq!(config.stop_timeout_or_default().as_secs(), 5);
    }

    #[test]
    fn accessors_default_on_empty() {
        let config = AppConfig::empty();
        assert_eq!(config.ability_id_or_default(), IVW_ABILITY);
        assert_eq!(config.keyword_count_or_default(), 1);
        assert_eq!(config.stop_timeout_or_default().as_secs(), 60);
        assert_eq!(config.backend_or_default(), "cpal");
        assert_eq!(config.log_level_or_default(), "info");
    }
}
