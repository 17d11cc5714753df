use super::respond;
use crate::commands::music::utils::{
    checks::{self, is_dj},
    embedded_messages,
    music_manager::{MusicError, MusicResult},
};
use crate::{CommandResult, Context};
use poise::CreateReply;
use tracing::info;

/// Show or change the playback volume
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "New volume in percent"] level: Option<u8>,
) -> CommandResult {
    let result = match level {
        Some(level) => set_volume(ctx, level).await,
        None => show_volume(ctx).await,
    };
    respond(ctx, result).await
}

async fn show_volume(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let level = match ctx.data().music.players.get(guild_id) {
        Some(player) => player.lock().await.volume(),
        None => ctx.data().settings(guild_id).default_volume,
    };
    Ok(embedded_messages::volume(level))
}

async fn set_volume(ctx: Context<'_>, level: u8) -> MusicResult<CreateReply> {
    let max = ctx.data().config.max_volume;
    if level > max {
        return Err(MusicError::VolumeOutOfRange { max });
    }

    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::NothingPlaying)?;
    player.lock().await.set_volume(level)?;

    info!("{} set the volume to {}% in guild {}", ctx.author().name, level, guild_id);
    Ok(embedded_messages::volume_set(level))
}

/// Restore the server's default volume
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "DJ",
    check = "is_dj"
)]
pub async fn resetvolume(ctx: Context<'_>) -> CommandResult {
    let result = reset_volume(ctx).await;
    respond(ctx, result).await
}

async fn reset_volume(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let level = ctx.data().settings(guild_id).default_volume;
    if let Some(player) = ctx.data().music.players.get(guild_id) {
        player.lock().await.set_volume(level)?;
    }
    Ok(embedded_messages::volume_set(level))
}
