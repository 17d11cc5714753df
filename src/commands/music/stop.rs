use super::respond;
use crate::commands::music::utils::{
    checks::{self, is_dj},
    embedded_messages,
    music_manager::MusicResult,
};
use crate::{CommandResult, Context};
use poise::CreateReply;
use tracing::info;

/// Stop playback and clear the queue
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "DJ",
    check = "is_dj"
)]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let result = stop_playback(ctx).await;
    respond(ctx, result).await
}

async fn stop_playback(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    ctx.data().music.stop(guild_id).await?;
    info!("{} stopped playback in guild {}", ctx.author().name, guild_id);
    Ok(embedded_messages::stopped())
}
