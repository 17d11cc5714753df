use super::respond;
use crate::commands::music::utils::{
    checks::{self, is_dj},
    embedded_messages,
    music_manager::{MusicError, MusicResult},
};
use crate::{CommandResult, Context};
use poise::{CreateReply, serenity_prelude as serenity};
use tracing::info;

/// Remove a track from the queue
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "DJ",
    check = "is_dj"
)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Queue position of the track to remove"]
    #[min = 1]
    position: usize,
) -> CommandResult {
    let result = remove_track(ctx, position).await;
    respond(ctx, result).await
}

async fn remove_track(ctx: Context<'_>, position: usize) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::QueueEmpty)?;

    let removed = player.lock().await.scheduler.queue_mut()?.remove(position)?;
    info!(
        "{} removed {} from the queue in guild {}",
        ctx.author().name,
        removed.metadata.title,
        guild_id
    );
    Ok(embedded_messages::track_removed(&removed, position))
}

/// Remove every queued track requested by a user
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "DJ",
    check = "is_dj"
)]
pub async fn removeuser(
    ctx: Context<'_>,
    #[description = "User whose tracks should go"] user: serenity::User,
) -> CommandResult {
    let result = remove_user_tracks(ctx, &user).await;
    respond(ctx, result).await
}

async fn remove_user_tracks(ctx: Context<'_>, user: &serenity::User) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::QueueEmpty)?;

    let removed = player
        .lock()
        .await
        .scheduler
        .queue_mut()?
        .remove_by_requester(user.id);
    Ok(embedded_messages::user_tracks_removed(&user.name, removed))
}
