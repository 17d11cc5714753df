//! Queue management reserved for DJs.

use super::respond;
use crate::commands::music::utils::{
    checks::{self, is_dj},
    embedded_messages,
    music_manager::{MusicError, MusicManager, MusicResult},
};
use crate::{CommandResult, Context};
use poise::CreateReply;
use tracing::info;

/// Bring the bot into your voice channel
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "DJ",
    check = "is_dj"
)]
pub async fn join(ctx: Context<'_>) -> CommandResult {
    let result = join_user(ctx).await;
    respond(ctx, result).await
}

async fn join_user(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let serenity_ctx = ctx.serenity_context();
    let music = &ctx.data().music;

    let player = music.players.playing(guild_id).await?;

    let channel_id =
        MusicManager::get_user_voice_channel(serenity_ctx, guild_id, ctx.author().id)?;

    // Joining again moves the bot, keeping the queue.
    MusicManager::join_channel(serenity_ctx, guild_id, channel_id).await?;
    player.lock().await.set_text_channel(ctx.channel_id());
    music.mark_idle_if_silent(guild_id).await;

    info!("Joined {} in guild {} for {}", channel_id, guild_id, ctx.author().name);
    Ok(embedded_messages::joined_channel(channel_id))
}

/// Remove every upcoming track
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "DJ",
    check = "is_dj"
)]
pub async fn clearqueue(ctx: Context<'_>) -> CommandResult {
    let result = clear_queue(ctx).await;
    respond(ctx, result).await
}

async fn clear_queue(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::QueueEmpty)?;

    let cleared = player.lock().await.scheduler.queue_mut()?.clear();
    Ok(embedded_messages::queue_cleared(cleared))
}

/// Shuffle the upcoming tracks
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "DJ",
    check = "is_dj"
)]
pub async fn shuffle(ctx: Context<'_>) -> CommandResult {
    let result = shuffle_queue(ctx).await;
    respond(ctx, result).await
}

pub(super) async fn shuffle_queue(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::QueueEmpty)?;

    let mut player = player.lock().await;
    let queue = player.scheduler.queue_mut()?;
    if queue.is_empty() {
        return Err(MusicError::QueueEmpty);
    }
    queue.shuffle();
    Ok(embedded_messages::shuffled(queue.len()))
}

/// Move a track to another position in the queue
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "DJ",
    check = "is_dj",
    rename = "move"
)]
pub async fn move_track(
    ctx: Context<'_>,
    #[description = "Current position of the track"]
    #[min = 1]
    from: usize,
    #[description = "Position to move it to"]
    #[min = 1]
    to: usize,
) -> CommandResult {
    let result = move_in_queue(ctx, from, to).await;
    respond(ctx, result).await
}

async fn move_in_queue(ctx: Context<'_>, from: usize, to: usize) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::QueueEmpty)?;

    let mut player = player.lock().await;
    let moved = player.scheduler.queue_mut()?.move_track(from, to)?;
    Ok(embedded_messages::track_moved(&moved.metadata, from, to))
}
