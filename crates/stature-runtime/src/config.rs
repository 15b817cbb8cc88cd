//! Runtime configuration
//!
//! Stored as JSON. Every field has a default, so a file only needs to name
//! what it changes.
//!
//! ```json
//! {
//!   "store": { "directory": "/var/lib/stature" },
//!   "matcher": { "min_observations": 100, "match_threshold": 0.01 },
//!   "log": { "level": "debug" }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stature_core::{StatureError, StatureResult};
use stature_identity::{MatcherConfig, StoreConfig};

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub store: StoreConfig,
    pub matcher: MatcherConfig,
    /// Sensor events held between ticks before new ones are dropped
    pub max_event_buffer: usize,
    /// Outputs held before the oldest are dropped
    pub max_output_buffer: usize,
    /// Capacity of the service's inbound and outbound channels
    pub channel_capacity: usize,
    pub log: LogConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            matcher: MatcherConfig::default(),
            max_event_buffer: 256,
            max_output_buffer: 1024,
            channel_capacity: 64,
            log: LogConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load from a JSON file
    pub fn from_json(path: &Path) -> StatureResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: RuntimeConfig = serde_json::from_str(&contents).map_err(|e| {
            StatureError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON
    pub fn to_json(&self, path: &Path) -> StatureResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StatureError::InvalidConfig(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> StatureResult<()> {
        self.store.validate()?;
        self.matcher.validate()?;
        if self.max_event_buffer == 0 || self.max_output_buffer == 0 {
            return Err(StatureError::InvalidConfig(
                "buffer sizes must be positive".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(StatureError::InvalidConfig(
                "channel_capacity must be positive".into(),
            ));
        }
        if self.log.level.trim().is_empty() {
            return Err(StatureError::InvalidConfig("log level must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = RuntimeConfig::default();
        config.validate().expect("default config should be valid");
        assert_eq!(config.matcher.min_observations, 100);
        assert_eq!(config.matcher.match_threshold, 0.01);
        assert_eq!(config.store.unknown_file, "unknownPeople.csv");
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stature.json");

        let mut original = RuntimeConfig::default();
        original.matcher.min_observations = 30;
        original.log.json = true;
        original.to_json(&path).unwrap();

        let loaded = RuntimeConfig::from_json(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stature.json");
        fs::write(&path, r#"{ "matcher": { "match_threshold": 0.5 } }"#).unwrap();

        let loaded = RuntimeConfig::from_json(&path).unwrap();
        assert_eq!(loaded.matcher.match_threshold, 0.5);
        assert_eq!(loaded.matcher.min_observations, 100);
        assert_eq!(loaded.channel_capacity, 64);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stature.json");
        fs::write(&path, "{ not json").unwrap();

        match RuntimeConfig::from_json(&path) {
            Err(StatureError::InvalidConfig(msg)) => assert!(msg.contains("stature.json")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let config = RuntimeConfig {
            channel_capacity: 0,
            ..RuntimeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = RuntimeConfig::from_json(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, StatureError::Io(_)));
    }
}
