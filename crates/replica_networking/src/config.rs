//! Engine configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! mode = "server"
//! tick_rate = 30
//! player_class = "CharacterActor"
//!
//! [guid]
//! a = 1
//! b = 0
//! c = 0
//! d = 0
//! ```

use std::path::Path;

use replica_core::Guid;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default tick rate (updates per second).
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Default initial capacity of replication and event frames, one MTU.
pub const DEFAULT_FRAME_CAPACITY: usize = 1200;

/// Which side of the connection an engine runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Follows the server, accepts its snapshots.
    #[default]
    Client,
    /// Source of truth for every static object.
    Server,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => f.write_str("client"),
            Self::Server => f.write_str("server"),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Side this engine runs on (default: client).
    #[serde(default)]
    pub mode: Mode,
    /// Ticks per second for drivers that run a fixed loop (default: 60).
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Initial capacity of the replication frame in bytes (default: 1200).
    #[serde(default = "default_frame_capacity")]
    pub replication_frame_capacity: usize,
    /// Initial capacity of each peer's event log in bytes (default: 1200).
    #[serde(default = "default_frame_capacity")]
    pub events_frame_capacity: usize,
    /// Class spawned for each joining player (default: `CharacterActor`).
    #[serde(default = "default_player_class")]
    pub player_class: String,
    /// Identifier of this engine (default: nil).
    #[serde(default)]
    pub guid: Guid,
}

fn default_tick_rate() -> u32 {
    DEFAULT_TICK_RATE
}

fn default_frame_capacity() -> usize {
    DEFAULT_FRAME_CAPACITY
}

fn default_player_class() -> String {
    "CharacterActor".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            guid: Guid::NIL,
            mode: Mode::default(),
            tick_rate: default_tick_rate(),
            replication_frame_capacity: default_frame_capacity(),
            events_frame_capacity: default_frame_capacity(),
            player_class: default_player_class(),
        }
    }
}

impl NetworkConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Duration of one tick in seconds.
    #[must_use]
    pub fn tick_interval(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

/// Errors raised while loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The text is not a valid configuration.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = NetworkConfig::from_toml_str("").unwrap();
        assert_eq!(config, NetworkConfig::default());
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.player_class, "CharacterActor");
    }

    #[test]
    fn test_partial_document() {
        let config = NetworkConfig::from_toml_str(
            r#"
            mode = "server"
            tick_rate = 20

            [guid]
            a = 7
            b = 0
            c = 0
            d = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, Mode::Server);
        assert_eq!(config.guid, Guid::new(7, 0, 0, 1));
        assert_eq!(config.tick_rate, 20);
        assert_eq!(config.replication_frame_capacity, DEFAULT_FRAME_CAPACITY);
        assert!((config.tick_interval() - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = NetworkConfig {
            mode: Mode::Server,
            guid: Guid::new(1, 2, 3, 4),
            ..NetworkConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(NetworkConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_bad_mode_is_parse_error() {
        let err = NetworkConfig::from_toml_str("mode = \"observer\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = NetworkConfig::load("/nonexistent/replica.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
