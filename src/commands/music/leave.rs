use super::respond;
use crate::commands::music::utils::{
    checks, embedded_messages,
    music_manager::MusicResult,
};
use crate::{CommandResult, Context};
use poise::CreateReply;
use tracing::info;

/// Leave the voice channel
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn leave(ctx: Context<'_>) -> CommandResult {
    let result = leave_channel(ctx).await;
    respond(ctx, result).await
}

async fn leave_channel(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    ctx.data()
        .music
        .disconnect(ctx.serenity_context(), guild_id)
        .await;
    info!("{} asked the bot to leave guild {}", ctx.author().name, guild_id);
    Ok(embedded_messages::left_voice_channel())
}
