//! Playback modes: repeats, looping and the infinite playlist.

use super::respond;
use crate::commands::music::utils::{
    checks::{self, is_dj},
    embedded_messages,
    music_manager::{MusicError, MusicResult},
};
use crate::{CommandResult, Context};
use poise::CreateReply;

/// Repeat the current track a number of times
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn repeat(
    ctx: Context<'_>,
    #[description = "How many extra times to play the current track"]
    #[min = 1]
    #[max = 30]
    times: u32,
) -> CommandResult {
    let result = set_repeat(ctx, times).await;
    respond(ctx, result).await
}

async fn set_repeat(ctx: Context<'_>, times: u32) -> MusicResult<CreateReply> {
    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::NothingPlaying)?;

    let mut player = player.lock().await;
    let queue = player.scheduler.queue_mut()?;
    queue.set_repeat(times)?;
    let current = queue.current().ok_or(MusicError::NothingPlaying)?;
    Ok(embedded_messages::repeat_set(&current.metadata, times))
}

/// Drop any pending repeats of the current track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn clearrepeat(ctx: Context<'_>) -> CommandResult {
    let result = clear_repeat(ctx).await;
    respond(ctx, result).await
}

async fn clear_repeat(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::NothingPlaying)?;

    let mut player = player.lock().await;
    let remaining = player.scheduler.queue_mut()?.clear_repeat();
    Ok(embedded_messages::repeat_cleared(remaining))
}

/// Loop the current track until looping is turned off
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Music",
    rename = "loop"
)]
pub async fn loop_track(ctx: Context<'_>) -> CommandResult {
    let result = toggle_loop(ctx).await;
    respond(ctx, result).await
}

async fn toggle_loop(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::NothingPlaying)?;

    let mut player = player.lock().await;
    let queue = player.scheduler.queue_mut()?;
    let metadata = queue
        .current()
        .map(|track| track.metadata.clone())
        .ok_or(MusicError::NothingPlaying)?;
    let enabled = queue.toggle_loop();
    Ok(embedded_messages::loop_toggled(&metadata, enabled))
}

/// Send finished tracks back to the end of the queue
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "DJ",
    check = "is_dj"
)]
pub async fn infinite(ctx: Context<'_>) -> CommandResult {
    let result = toggle_infinite(ctx).await;
    respond(ctx, result).await
}

async fn toggle_infinite(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::NothingPlaying)?;

    let mut player = player.lock().await;
    let enabled = player.scheduler.queue_mut()?.toggle_infinite();
    Ok(embedded_messages::infinite_toggled(enabled))
}

