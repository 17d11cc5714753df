//! Sample data used across the integration tests

use std::time::Duration;

use cadence::commands::music::utils::audio_sources::{QueuedTrack, TrackMetadata};
use poise::serenity_prelude::UserId;

/// Sample user IDs for testing
pub const ALICE: u64 = 123456789;
pub const BOB: u64 = 987654321;

/// Sample guild ID for testing
pub const SAMPLE_GUILD_ID: u64 = 555000111;

/// A complete configuration file, as an operator would write it
pub const SAMPLE_CONFIG: &str = r#"{
    "prefix": "!",
    "database_path": "cadence.db",
    "max_volume": 120,
    "max_queue_len": 3,
    "defaults": {
        "dj_role": "Selector",
        "vote_ratio": 0.6,
        "vote_timeout": "45s",
        "default_volume": 80
    },
    "inactivity": {
        "idle_timeout": "10m",
        "alone_timeout": "1m",
        "poll_interval": "5s"
    },
    "radio_stations": [
        {
            "slug": "lofi",
            "name": "Lofi Beats",
            "stream_url": "https://streams.example.com/lofi.mp3",
            "website": "https://lofi.example.com"
        },
        {
            "slug": "jazz",
            "name": "Late Night Jazz",
            "stream_url": "https://streams.example.com/jazz.mp3"
        }
    ]
}"#;

/// A queued track named `title`, three minutes long, requested by `user`
pub fn track(title: &str, user: u64) -> QueuedTrack {
    QueuedTrack::new(
        TrackMetadata {
            title: title.to_string(),
            url: Some(format!("https://youtu.be/{}", title)),
            duration: Some(Duration::from_secs(180)),
            thumbnail: None,
            requested_by: Some(user.to_string()),
        },
        UserId::new(user),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_track() {
        let track = track("intro", ALICE);
        assert_eq!(track.requester, UserId::new(ALICE));
        assert_eq!(track.metadata.duration, Some(Duration::from_secs(180)));
    }
}
