use super::respond;
use crate::commands::music::utils::{
    audio_sources::{AudioSource, QueuedTrack},
    checks, embedded_messages,
    music_manager::{MusicManager, MusicResult, Playback},
};
use crate::{CommandResult, Context};
use poise::CreateReply;
use tracing::info;

/// Play a song from YouTube, a direct URL or a search query
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"]
    #[rest]
    query: String,
) -> CommandResult {
    info!("{} requested: {}", ctx.author().name, query);

    // Resolving a search takes longer than Discord's reply window
    ctx.defer().await?;

    let result = enqueue(ctx, &query).await;
    respond(ctx, result).await
}

async fn enqueue(ctx: Context<'_>, query: &str) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let serenity_ctx = ctx.serenity_context();
    let data = ctx.data();

    let call = MusicManager::connect_with_user(serenity_ctx, guild_id, ctx.author().id).await?;
    let settings = data.settings(guild_id);
    let player =
        data.music
            .players
            .get_or_create(guild_id, ctx.channel_id(), settings.default_volume);
    // Cleared again once a track starts
    data.music.mark_idle_if_silent(guild_id).await;

    // Fail before the slow lookup when the radio owns the player
    player.lock().await.scheduler.queue()?;

    let metadata = AudioSource::resolve(query, ctx.author().name.clone()).await?;

    let queued = {
        let mut player = player.lock().await;
        player.set_text_channel(ctx.channel_id());
        let queue = player.scheduler.queue_mut()?;
        let position = queue.push(
            QueuedTrack::new(metadata.clone(), ctx.author().id),
            data.config.max_queue_len,
        )?;
        embedded_messages::added_to_queue(&metadata, position, queue)
    };

    match data.music.start_if_idle(serenity_ctx, guild_id, call).await? {
        Playback::Busy => Ok(queued),
        Playback::Started(started) => Ok(embedded_messages::now_playing(&started)),
        Playback::Finished => Ok(embedded_messages::error(format!(
            "Could not play {}",
            metadata.title
        ))),
    }
}
