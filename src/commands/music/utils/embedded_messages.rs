use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{CreateEmbed, CreateEmbedFooter};
use serenity::model::id::ChannelId;
use std::fmt::Display;
use std::time::Duration;

use super::audio_sources::{QueuedTrack, TrackMetadata};
use super::format_duration;
use super::inactivity::IdleReason;
use super::scheduler::QueueScheduler;
use super::vote::{APPROVE_EMOJI, REJECT_EMOJI, VoteOutcome, VoteTally};
use crate::utils::config::RadioStation;

const SUCCESS: u32 = 0x00ff00;
const FAILURE: u32 = 0xff0000;
const INFO: u32 = 0x5865f2;

/// Upcoming tracks listed in `/queue` before the rest is summarised.
const QUEUE_PAGE: usize = 10;

/// Create a progress bar for the current track
fn format_progress_bar(position: Duration, total: Duration) -> String {
    const BAR_LENGTH: usize = 15;
    let progress = if total.as_secs() == 0 {
        0.0
    } else {
        (position.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
    };

    let filled = (progress * BAR_LENGTH as f64).round() as usize;
    let empty = BAR_LENGTH - filled;

    format!("▬{}🔘{}▬", "▬".repeat(filled), "▬".repeat(empty))
}

/// Parse the metadata for the now playing and added to queue embeds
fn parse_metadata(metadata: &TrackMetadata) -> (String, String, String) {
    let title = metadata.title.clone();
    let url = metadata.url.clone().unwrap_or_else(|| "#".to_string());
    let duration_str = metadata
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "Unknown duration".to_string());

    (title, url, duration_str)
}

/// Backslash-escape characters Discord markdown would interpret.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']' | '(' | ')' | '*' | '_' | '~' | '`' | '|' | '>') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Masked link to the track. Parentheses in the URL are percent-encoded so they cannot
/// close the link early.
fn link(metadata: &TrackMetadata) -> String {
    let (title, url, _) = parse_metadata(metadata);
    let url = url.replace('(', "%28").replace(')', "%29").replace(' ', "%20");
    format!("[{}]({})", escape_markdown(&title), url)
}

fn success(title: impl Into<String>, description: impl Into<String>) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(title)
            .description(description)
            .color(SUCCESS),
    )
}

/// Error embed shown to the invoking user only
pub fn error(err: impl Display) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(err.to_string())
                .color(FAILURE),
        )
        .ephemeral(true)
}

/// Create an embed for when a song starts playing right away
pub fn now_playing(metadata: &TrackMetadata) -> CreateReply {
    let (_, _, duration_str) = parse_metadata(metadata);

    let mut embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(link(metadata))
        .field("Duration", format!("`{}`", duration_str), true)
        .color(SUCCESS);
    if let Some(requested_by) = &metadata.requested_by {
        embed = embed.field("Requested by", requested_by, true);
    }
    if let Some(thumbnail) = &metadata.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    CreateReply::default().embed(embed)
}

/// Create an embed describing the track that is playing right now
pub fn current_track(metadata: &TrackMetadata, position: Option<Duration>, paused: bool) -> CreateReply {
    let title = if paused { "⏸️ Currently Paused" } else { "🎵 Currently Playing" };
    let mut description = link(metadata);

    if let (Some(duration), Some(pos)) = (metadata.duration, position) {
        description.push_str(&format!(
            "\n{} `{}/{}`",
            format_progress_bar(pos, duration),
            format_duration(pos),
            format_duration(duration)
        ));
    }

    let mut embed = CreateEmbed::new()
        .title(title)
        .description(description)
        .color(SUCCESS);
    if let Some(requested_by) = &metadata.requested_by {
        embed = embed.field("Requested by", requested_by, true);
    }
    if let Some(thumbnail) = &metadata.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    CreateReply::default().embed(embed)
}

/// Create an embed for when a song is added to the queue
pub fn added_to_queue(metadata: &TrackMetadata, position: usize, queue: &QueueScheduler) -> CreateReply {
    let (_, _, duration_str) = parse_metadata(metadata);

    let mut embed = CreateEmbed::new()
        .title("🎵 Added to Queue")
        .description(link(metadata))
        .field("Duration", format!("`{}`", duration_str), true)
        .field("Position", format!("`#{}`", position), true)
        .color(SUCCESS);

    if let Some(thumbnail) = &metadata.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    let total = queue.total_duration();
    if queue.len() > 1 {
        let info = if total.as_secs() > 0 {
            format!(
                "`{} tracks` • Total Length: `{}`",
                queue.len(),
                format_duration(total)
            )
        } else {
            format!("`{} tracks`", queue.len())
        };
        embed = embed.field("Queue Info", info, false);
    }

    CreateReply::default().embed(embed)
}

/// Create an embed for the music queue
pub fn music_queue(queue: &QueueScheduler, position: Option<Duration>) -> CreateReply {
    let mut description = String::new();

    if let Some(current) = queue.current() {
        description.push_str("**🎵 Now Playing**\n");
        description.push_str(&format!("**{}**\n", link(&current.metadata)));

        if let (Some(duration), Some(pos)) = (current.metadata.duration, position) {
            description.push_str(&format!(
                "{} `{}/{}`\n",
                format_progress_bar(pos, duration),
                format_duration(pos),
                format_duration(duration)
            ));
        }
        description.push('\n');
    } else {
        description.push_str("**🔇 Nothing playing**\n\n");
    }

    if queue.is_empty() {
        description.push_str("**📭 Queue is empty**");
    } else {
        description.push_str(&format!("**📋 Queue - {} tracks**\n", queue.len()));
        for (index, track) in queue.upcoming().take(QUEUE_PAGE).enumerate() {
            description.push_str(&format!("`{}.` {}", index + 1, link(&track.metadata)));
            if let Some(duration) = track.metadata.duration {
                description.push_str(&format!(" `{}`", format_duration(duration)));
            }
            description.push('\n');
        }
        if queue.len() > QUEUE_PAGE {
            description.push_str(&format!("*…and {} more*\n", queue.len() - QUEUE_PAGE));
        }

        let total = queue.total_duration();
        if total.as_secs() > 0 {
            description.push_str(&format!(
                "\n**⏱️ Total Duration:** `{}`",
                format_duration(total)
            ));
        }
    }

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🎵 Music Queue")
            .description(description)
            .footer(CreateEmbedFooter::new(playback_modes(queue)))
            .color(SUCCESS),
    )
}

fn playback_modes(queue: &QueueScheduler) -> String {
    let on_off = |enabled: bool| if enabled { "on" } else { "off" };
    format!(
        "Loop: {} • Repeats left: {} • Infinite playlist: {}",
        on_off(queue.is_looped()),
        queue.repeats_left(),
        on_off(queue.is_infinite())
    )
}

/// Create an embed for when a track is paused
pub fn paused(metadata: &TrackMetadata) -> CreateReply {
    success("⏸️ Paused", format!("Paused {}", link(metadata)))
}

/// Create an embed for when a track is resumed
pub fn resumed(metadata: &TrackMetadata) -> CreateReply {
    success("▶️ Resumed", format!("Resumed {}", link(metadata)))
}

/// Create an embed for when a track is skipped
pub fn skipped(metadata: &TrackMetadata) -> CreateReply {
    success("⏭️ Skipped", format!("Skipped {}", link(metadata)))
}

pub fn skipped_to(metadata: &TrackMetadata, position: usize) -> CreateReply {
    success(
        "⏭️ Skipped Ahead",
        format!("Jumping to {} (was `#{}`)", link(metadata), position),
    )
}

/// Create an embed for when the bot stops playing music
pub fn stopped() -> CreateReply {
    success("⏹️ Stopped", "Playback stopped and queue cleared")
}

pub fn repeat_set(metadata: &TrackMetadata, times: u32) -> CreateReply {
    success(
        "🔂 Repeat",
        format!("{} will be repeated `{}` more time(s)", link(metadata), times),
    )
}

pub fn repeat_cleared(remaining: u32) -> CreateReply {
    success(
        "🔂 Repeat Cleared",
        format!("Dropped `{}` pending repeat(s)", remaining),
    )
}

pub fn loop_toggled(metadata: &TrackMetadata, enabled: bool) -> CreateReply {
    if enabled {
        success("🔁 Loop Enabled", format!("Looping {}", link(metadata)))
    } else {
        success("🔁 Loop Disabled", format!("No longer looping {}", link(metadata)))
    }
}

pub fn infinite_toggled(enabled: bool) -> CreateReply {
    if enabled {
        success(
            "♾️ Infinite Playlist Enabled",
            "Finished tracks go back to the end of the queue",
        )
    } else {
        success(
            "♾️ Infinite Playlist Disabled",
            "Finished tracks leave the queue",
        )
    }
}

pub fn volume(level: u8) -> CreateReply {
    success("🔊 Volume", format!("Current volume is `{}%`", level))
}

pub fn volume_set(level: u8) -> CreateReply {
    success("🔊 Volume Changed", format!("Volume set to `{}%`", level))
}

pub fn shuffled(count: usize) -> CreateReply {
    success("🔀 Shuffled", format!("Shuffled `{}` tracks", count))
}

pub fn queue_cleared(count: usize) -> CreateReply {
    success("🧹 Queue Cleared", format!("Removed `{}` tracks", count))
}

pub fn track_moved(metadata: &TrackMetadata, from: usize, to: usize) -> CreateReply {
    success(
        "↕️ Track Moved",
        format!("Moved {} from `#{}` to `#{}`", link(metadata), from, to),
    )
}

/// Create an embed for when a track is removed from the queue
pub fn track_removed(track: &QueuedTrack, position: usize) -> CreateReply {
    success(
        "🗑️ Track Removed",
        format!("Removed {} from position #{}", link(&track.metadata), position),
    )
}

pub fn user_tracks_removed(user: &str, count: usize) -> CreateReply {
    success(
        "🗑️ Tracks Removed",
        format!("Removed `{}` tracks queued by **{}**", count, user),
    )
}

pub fn joined_channel(channel_id: ChannelId) -> CreateReply {
    success("🎧 Joined", format!("Now in <#{}>", channel_id))
}

/// Create an embed for when the bot leaves a voice channel
pub fn left_voice_channel() -> CreateReply {
    success(
        "👋 Left Voice Channel",
        "Successfully disconnected and cleared the queue",
    )
}

pub fn left_due_to_inactivity(reason: IdleReason) -> CreateEmbed {
    let description = match reason {
        IdleReason::NotPlaying => "Nothing was playing for a while, so I left the voice channel",
        IdleReason::Alone => "Everyone left the voice channel, so I left too",
    };
    CreateEmbed::new()
        .title("💤 Left Voice Channel")
        .description(description)
        .color(INFO)
}

pub fn radio_playing(station: &RadioStation) -> CreateReply {
    success(
        "📻 Radio",
        format!("Now streaming **{}**", station.name),
    )
}

pub fn radio_stopped(station: &RadioStation) -> CreateReply {
    success("📻 Radio Stopped", format!("Stopped **{}**", station.name))
}

pub fn radio_info(station: &RadioStation, volume: u8) -> CreateReply {
    let mut embed = CreateEmbed::new()
        .title(format!("📻 {}", station.name))
        .field("Station", format!("`{}`", station.slug), true)
        .field("Volume", format!("`{}%`", volume), true)
        .color(INFO);
    if let Some(website) = &station.website {
        embed = embed.url(website);
    }
    CreateReply::default().embed(embed)
}

pub fn radio_list(stations: &[RadioStation]) -> CreateReply {
    let description = if stations.is_empty() {
        "No radio stations are configured".to_string()
    } else {
        stations
            .iter()
            .map(|station| format!("`{}` • {}", station.slug, station.name))
            .collect::<Vec<_>>()
            .join("\n")
    };
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("📻 Radio Stations")
            .description(description)
            .color(INFO),
    )
}

pub fn vote_started(action: &str, tally: &VoteTally, timeout: Duration) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(format!("🗳️ Vote: {}", action))
            .description(format!(
                "React with {} to agree or {} to disagree.\n`{}` of `{}` listeners must agree.",
                APPROVE_EMOJI,
                REJECT_EMOJI,
                tally.required(),
                tally.eligible()
            ))
            .footer(CreateEmbedFooter::new(format!(
                "Vote closes in {}",
                format_duration(timeout)
            )))
            .color(INFO),
    )
}

pub fn vote_finished(action: &str, tally: &VoteTally, outcome: VoteOutcome) -> CreateReply {
    let (title, color) = match outcome {
        VoteOutcome::Passed => (format!("✅ Vote passed: {}", action), SUCCESS),
        _ => (format!("❌ Vote failed: {}", action), FAILURE),
    };
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(title)
            .description(format!(
                "`{}` for, `{}` against, `{}` needed",
                tally.yes(),
                tally.no(),
                tally.required()
            ))
            .color(color),
    )
}
