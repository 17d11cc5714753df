use std::time::Duration;

use cadence::utils::config::GuildDefaults;
use cadence::utils::database::{Database, GuildSettings};
use poise::serenity_prelude::GuildId;
use pretty_assertions::assert_eq;

use crate::common::TempDatabase;
use crate::common::fixtures::SAMPLE_GUILD_ID;

fn guild() -> GuildId {
    GuildId::new(SAMPLE_GUILD_ID)
}

#[test]
fn statistics_survive_a_restart() {
    let file = TempDatabase::new("stats");
    {
        let db = file.open();
        db.increase_deleted_messages(guild()).unwrap();
        db.increase_deleted_messages(guild()).unwrap();
        db.increase_deleted_reactions(guild()).unwrap();
        db.increase_tracks_played(guild()).unwrap();
    }

    let db = file.open();
    let stats = db.find_stats(guild()).unwrap().expect("stats were stored");
    assert_eq!(stats.messages_deleted, 2);
    assert_eq!(stats.reactions_deleted, 1);
    assert_eq!(stats.tracks_played, 1);
}

#[test]
fn settings_survive_a_restart() {
    let file = TempDatabase::new("settings");
    let defaults = GuildDefaults::default();
    let custom = GuildSettings {
        dj_role: "Selector".to_string(),
        vote_ratio: 0.75,
        vote_timeout: Duration::from_secs(90),
        default_volume: 60,
    };
    file.open().save_settings(guild(), &custom).unwrap();

    let loaded = file.open().guild_settings(guild(), &defaults).unwrap();
    assert_eq!(loaded, custom);
}

#[test]
fn reset_only_touches_one_guild() {
    let db = Database::open_in_memory().unwrap();
    let other = GuildId::new(SAMPLE_GUILD_ID + 1);
    db.increase_tracks_played(guild()).unwrap();
    db.increase_tracks_played(other).unwrap();

    db.reset_stats(guild()).unwrap();

    assert_eq!(db.find_stats(guild()).unwrap().unwrap().tracks_played, 0);
    assert_eq!(db.find_stats(other).unwrap().unwrap().tracks_played, 1);
}
