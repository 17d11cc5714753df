use super::respond;
use crate::commands::music::utils::{
    checks, embedded_messages,
    music_manager::{MusicError, MusicResult},
    scheduler::{QueueScheduler, Scheduler},
};
use crate::{CommandResult, Context};
use poise::CreateReply;
use songbird::tracks::PlayMode;

/// Show the current queue
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let result = show_queue(ctx).await;
    respond(ctx, result).await
}

async fn show_queue(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let Some(player) = ctx.data().music.players.get(guild_id) else {
        return Ok(embedded_messages::music_queue(&QueueScheduler::default(), None));
    };

    let player = player.lock().await;
    let position = player.position().await;
    match &player.scheduler {
        Scheduler::Queue(queue) => Ok(embedded_messages::music_queue(queue, position)),
        Scheduler::Radio(radio) => Ok(embedded_messages::radio_info(
            radio.station(),
            player.volume(),
        )),
    }
}

/// Show the track that is playing right now
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Music",
    aliases("np")
)]
pub async fn nowplaying(ctx: Context<'_>) -> CommandResult {
    let result = show_current(ctx).await;
    respond(ctx, result).await
}

async fn show_current(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::NothingPlaying)?;

    let player = player.lock().await;
    let metadata = player
        .current_metadata()
        .ok_or(MusicError::NothingPlaying)?;
    let paused = matches!(player.play_mode().await, Some(PlayMode::Pause));
    let position = player.position().await;

    Ok(embedded_messages::current_track(&metadata, position, paused))
}
