//! Internet radio: one station streams instead of the queue until stopped.

use super::respond;
use crate::commands::music::utils::{
    checks, embedded_messages,
    music_manager::{MusicError, MusicManager, MusicResult},
};
use crate::{CommandResult, Context};
use poise::{CreateReply, serenity_prelude as serenity};
use tracing::info;

/// Stream an internet radio station
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Radio",
    subcommands("radio_play", "radio_stop", "radio_info", "radio_list"),
    subcommand_required
)]
pub async fn radio(_ctx: Context<'_>) -> CommandResult {
    Ok(())
}

async fn autocomplete_station(
    ctx: Context<'_>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let partial = partial.to_lowercase();
    ctx.data()
        .config
        .radio_stations
        .iter()
        .filter(|station| {
            station.slug.to_lowercase().contains(&partial)
                || station.name.to_lowercase().contains(&partial)
        })
        .take(25)
        .map(|station| serenity::AutocompleteChoice::new(station.name.clone(), station.slug.clone()))
        .collect()
}

/// Start streaming a station
#[poise::command(slash_command, prefix_command, guild_only, rename = "play")]
pub async fn radio_play(
    ctx: Context<'_>,
    #[description = "Station to play"]
    #[autocomplete = "autocomplete_station"]
    station: String,
) -> CommandResult {
    let result = start_station(ctx, &station).await;
    respond(ctx, result).await
}

async fn start_station(ctx: Context<'_>, slug: &str) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let data = ctx.data();
    let station = data
        .config
        .station(slug)
        .cloned()
        .ok_or_else(|| MusicError::UnknownStation(slug.to_string()))?;

    let serenity_ctx = ctx.serenity_context();
    let call = MusicManager::connect_with_user(serenity_ctx, guild_id, ctx.author().id).await?;
    let settings = data.settings(guild_id);
    data.music
        .players
        .get_or_create(guild_id, ctx.channel_id(), settings.default_volume)
        .lock()
        .await
        .set_text_channel(ctx.channel_id());
    data.music.mark_idle_if_silent(guild_id).await;

    data.music
        .play_radio(serenity_ctx, guild_id, call, station.clone())
        .await?;
    info!("{} started radio {} in guild {}", ctx.author().name, station.slug, guild_id);
    Ok(embedded_messages::radio_playing(&station))
}

/// Stop the radio and go back to the queue
#[poise::command(slash_command, prefix_command, guild_only, rename = "stop")]
pub async fn radio_stop(ctx: Context<'_>) -> CommandResult {
    let result = stop_station(ctx).await;
    respond(ctx, result).await
}

async fn stop_station(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    let station = ctx.data().music.stop_radio(guild_id).await?;
    Ok(embedded_messages::radio_stopped(&station))
}

/// Show the station that is streaming
#[poise::command(slash_command, prefix_command, guild_only, rename = "info")]
pub async fn radio_info(ctx: Context<'_>) -> CommandResult {
    let result = station_info(ctx).await;
    respond(ctx, result).await
}

async fn station_info(ctx: Context<'_>) -> MusicResult<CreateReply> {
    let guild_id = checks::guild_id(ctx)?;
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::NothingPlaying)?;

    let player = player.lock().await;
    let station = player
        .scheduler
        .station()
        .ok_or(MusicError::NothingPlaying)?;
    Ok(embedded_messages::radio_info(station, player.volume()))
}

/// List the available stations
#[poise::command(slash_command, prefix_command, rename = "list")]
pub async fn radio_list(ctx: Context<'_>) -> CommandResult {
    ctx.send(embedded_messages::radio_list(&ctx.data().config.radio_stations))
        .await?;
    Ok(())
}
