//! Loads the bot configuration from an optional JSON file, with defaults for every field.
//! The Discord token is only ever read from the environment.

use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "CADENCE_CONFIG";
/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing {0} in environment")]
    MissingToken(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Values a guild uses until an admin overrides them with `/settings`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuildDefaults {
    pub dj_role: String,
    pub vote_ratio: f64,
    #[serde(with = "humantime_serde")]
    pub vote_timeout: Duration,
    pub default_volume: u8,
}

impl Default for GuildDefaults {
    fn default() -> Self {
        Self {
            dj_role: "DJ".to_string(),
            vote_ratio: 0.5,
            vote_timeout: Duration::from_secs(30),
            default_volume: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct InactivityConfig {
    /// How long the bot may sit in a channel with nothing playing.
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// How long the bot may sit in a channel without any listeners.
    #[serde(with = "humantime_serde")]
    pub alone_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for InactivityConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(5 * 60),
            alone_timeout: Duration::from_secs(2 * 60),
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// An internet radio station that `/radio play` can stream.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RadioStation {
    pub slug: String,
    pub name: String,
    pub stream_url: String,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    pub prefix: String,
    pub database_path: PathBuf,
    pub defaults: GuildDefaults,
    pub max_volume: u8,
    pub max_queue_len: usize,
    pub inactivity: InactivityConfig,
    pub radio_stations: Vec<RadioStation>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: "$".to_string(),
            database_path: PathBuf::from("application_data.db"),
            defaults: GuildDefaults::default(),
            max_volume: 150,
            max_queue_len: 500,
            inactivity: InactivityConfig::default(),
            radio_stations: Vec::new(),
        }
    }
}

impl BotConfig {
    /// Load from the file named by `CADENCE_CONFIG`, or fall back to defaults when unset.
    pub fn load() -> Result<Self, ConfigError> {
        match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) => {
                info!("{} not set, using default configuration", CONFIG_ENV);
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Config file {} does not exist, using default configuration",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.defaults.vote_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "vote_ratio must be in (0, 1], got {}",
                ratio
            )));
        }
        if self.defaults.default_volume > self.max_volume {
            return Err(ConfigError::Invalid(format!(
                "default_volume {} exceeds max_volume {}",
                self.defaults.default_volume, self.max_volume
            )));
        }
        if self.inactivity.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_queue_len == 0 {
            return Err(ConfigError::Invalid(
                "max_queue_len must be greater than zero".to_string(),
            ));
        }

        let mut slugs = HashSet::new();
        for station in &self.radio_stations {
            if !slugs.insert(station.slug.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate radio station slug '{}'",
                    station.slug
                )));
            }
        }

        Ok(())
    }

    pub fn station(&self, slug: &str) -> Option<&RadioStation> {
        self.radio_stations
            .iter()
            .find(|station| station.slug.eq_ignore_ascii_case(slug))
    }

    pub fn discord_token() -> Result<String, ConfigError> {
        env::var(TOKEN_ENV).map_err(|_| ConfigError::MissingToken(TOKEN_ENV))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        let config = BotConfig::from_json("{}").unwrap();
        assert_eq!(config, BotConfig::default());
    }

    #[test]
    fn parses_humantime_durations_and_stations() {
        let raw = r#"{
            "prefix": "!",
            "defaults": { "vote_timeout": "45s", "vote_ratio": 0.75 },
            "inactivity": { "idle_timeout": "10m", "poll_interval": "5s" },
            "radio_stations": [
                { "slug": "jazz", "name": "Smooth Jazz", "stream_url": "https://example.com/jazz.mp3" }
            ]
        }"#;

        let config = BotConfig::from_json(raw).unwrap();

        assert_eq!(config.prefix, "!");
        assert_eq!(config.defaults.vote_timeout, Duration::from_secs(45));
        assert_eq!(config.defaults.dj_role, "DJ");
        assert_eq!(config.inactivity.idle_timeout, Duration::from_secs(600));
        assert_eq!(config.inactivity.alone_timeout, Duration::from_secs(120));
        assert_eq!(config.station("JAZZ").map(|s| s.name.as_str()), Some("Smooth Jazz"));
        assert!(config.station("rock").is_none());
    }

    #[test]
    fn rejects_out_of_range_vote_ratio() {
        let result = BotConfig::from_json(r#"{ "defaults": { "vote_ratio": 1.5 } }"#);
        assert_matches!(result, Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_default_volume_above_max() {
        let result =
            BotConfig::from_json(r#"{ "max_volume": 80, "defaults": { "default_volume": 90 } }"#);
        assert_matches!(result, Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_duplicate_station_slugs() {
        let raw = r#"{ "radio_stations": [
            { "slug": "a", "name": "A", "stream_url": "https://a" },
            { "slug": "a", "name": "B", "stream_url": "https://b" }
        ] }"#;
        assert_matches!(BotConfig::from_json(raw), Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert_matches!(BotConfig::from_json("{ nope"), Err(ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("cadence-config-that-does-not-exist.json");
        let config = BotConfig::from_file(path).unwrap();
        assert_eq!(config, BotConfig::default());
    }
}
