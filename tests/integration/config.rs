use std::time::Duration;

use cadence::utils::config::{BotConfig, ConfigError};
use cadence::utils::database::GuildSettings;
use pretty_assertions::assert_eq;

use crate::common::fixtures::SAMPLE_CONFIG;

#[test]
fn sample_config_loads_every_section() {
    let config = BotConfig::from_json(SAMPLE_CONFIG).expect("sample config is valid");

    assert_eq!(config.prefix, "!");
    assert_eq!(config.max_volume, 120);
    assert_eq!(config.max_queue_len, 3);
    assert_eq!(config.defaults.dj_role, "Selector");
    assert_eq!(config.defaults.vote_timeout, Duration::from_secs(45));
    assert_eq!(config.inactivity.idle_timeout, Duration::from_secs(600));
    assert_eq!(config.inactivity.poll_interval, Duration::from_secs(5));
    assert_eq!(config.radio_stations.len(), 2);
    assert_eq!(config.radio_stations[1].website, None);
}

#[test]
fn stations_are_found_by_slug_in_any_case() {
    let config = BotConfig::from_json(SAMPLE_CONFIG).expect("sample config is valid");

    let station = config.station("LoFi").expect("lofi is configured");
    assert_eq!(station.name, "Lofi Beats");
    assert!(config.station("metal").is_none());
}

#[test]
fn guild_settings_start_from_config_defaults() {
    let config = BotConfig::from_json(SAMPLE_CONFIG).expect("sample config is valid");
    let settings = GuildSettings::from(&config.defaults);

    assert_eq!(settings.dj_role, "Selector");
    assert_eq!(settings.vote_ratio, 0.6);
    assert_eq!(settings.default_volume, 80);
}

#[test]
fn zero_queue_length_is_rejected() {
    let result = BotConfig::from_json(r#"{ "max_queue_len": 0 }"#);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn config_file_is_read_from_disk() {
    let mut path = std::env::temp_dir();
    path.push(format!("cadence-config-{}.json", std::process::id()));
    std::fs::write(&path, SAMPLE_CONFIG).expect("write sample config");

    let config = BotConfig::from_file(&path);
    let _ = std::fs::remove_file(&path);

    assert_eq!(config.expect("config loads").prefix, "!");
}
