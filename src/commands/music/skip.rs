use super::respond;
use crate::commands::music::utils::{
    checks::{self, is_dj},
    embedded_messages,
    music_manager::MusicResult,
};
use crate::{CommandResult, Context};
use poise::CreateReply;
use tracing::info;

/// Skip the current track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let result = skip_current(ctx).await;
    respond(ctx, result).await
}

async fn skip_current(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    let skipped = ctx.data().music.skip(guild_id).await?;
    info!("{} skipped {} in guild {}", ctx.author().name, skipped.title, guild_id);
    Ok(embedded_messages::skipped(&skipped))
}

/// Skip ahead to a track in the queue
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "DJ",
    check = "is_dj"
)]
pub async fn skipto(
    ctx: Context<'_>,
    #[description = "Queue position to jump to"]
    #[min = 1]
    position: usize,
) -> CommandResult {
    let result = skip_to_position(ctx, position).await;
    respond(ctx, result).await
}

async fn skip_to_position(ctx: Context<'_>, position: usize) -> MusicResult<CreateReply> {
    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    let target = ctx.data().music.skip_to(guild_id, position).await?;
    Ok(embedded_messages::skipped_to(&target, position))
}
