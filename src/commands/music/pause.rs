use super::respond;
use crate::commands::music::utils::{
    checks, embedded_messages,
    music_manager::{MusicError, MusicResult},
};
use crate::{CommandResult, Context};
use poise::CreateReply;
use songbird::tracks::PlayMode;

/// Pause the current track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let result = toggle(ctx, PlayMode::Play).await;
    respond(ctx, result).await
}

/// Resume the paused track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    let result = toggle(ctx, PlayMode::Pause).await;
    respond(ctx, result).await
}

/// Flip the playback state, provided the track is currently in `from`.
async fn toggle(ctx: Context<'_>, from: PlayMode) -> MusicResult<CreateReply> {
    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    let music = &ctx.data().music;

    let (metadata, mode) = {
        let player = music
            .players
            .get(guild_id)
            .ok_or(MusicError::NothingPlaying)?;
        let player = player.lock().await;
        let metadata = player
            .current_metadata()
            .ok_or(MusicError::NothingPlaying)?;
        (metadata, player.play_mode().await)
    };

    match (from, mode) {
        (PlayMode::Play, Some(PlayMode::Play)) => {
            music.pause(guild_id).await?;
            Ok(embedded_messages::paused(&metadata))
        }
        (PlayMode::Pause, Some(PlayMode::Pause)) => {
            music.resume(guild_id).await?;
            Ok(embedded_messages::resumed(&metadata))
        }
        (PlayMode::Play, Some(PlayMode::Pause)) => {
            Ok(embedded_messages::error("The track is already paused"))
        }
        (PlayMode::Pause, Some(PlayMode::Play)) => {
            Ok(embedded_messages::error("The track is not paused"))
        }
        _ => Err(MusicError::NothingPlaying),
    }
}
