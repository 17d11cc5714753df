//! Vote-gated versions of the DJ commands, open to everyone listening.

use super::{dj, respond};
use crate::commands::music::utils::{
    checks, embedded_messages,
    music_manager::{MusicError, MusicManager, MusicResult},
    vote::{VoteOutcome, run_vote},
};
use crate::{CommandResult, Context, Error};
use poise::serenity_prelude::{GuildId, UserId};
use tracing::info;

/// Start a vote to skip the current track
#[poise::command(slash_command, prefix_command, guild_only, category = "Vote")]
pub async fn voteskip(ctx: Context<'_>) -> CommandResult {
    let Some(guild_id) = hold_vote(ctx, "skip the current track", true).await? else {
        return Ok(());
    };
    let result = ctx
        .data()
        .music
        .skip(guild_id)
        .await
        .map(|skipped| embedded_messages::skipped(&skipped));
    respond(ctx, result).await
}

/// Start a vote to shuffle the queue
#[poise::command(slash_command, prefix_command, guild_only, category = "Vote")]
pub async fn voteshuffle(ctx: Context<'_>) -> CommandResult {
    if hold_vote(ctx, "shuffle the queue", false).await?.is_none() {
        return Ok(());
    }
    let result = dj::shuffle_queue(ctx).await;
    respond(ctx, result).await
}

/// Start a vote to clear the queue
#[poise::command(slash_command, prefix_command, guild_only, category = "Vote")]
pub async fn voteclear(ctx: Context<'_>) -> CommandResult {
    let Some(guild_id) = hold_vote(ctx, "clear the queue", false).await? else {
        return Ok(());
    };
    let result = clear(ctx, guild_id).await;
    respond(ctx, result).await
}

/// Start a vote to stop playback
#[poise::command(slash_command, prefix_command, guild_only, category = "Vote")]
pub async fn votestop(ctx: Context<'_>) -> CommandResult {
    let Some(guild_id) = hold_vote(ctx, "stop playback", true).await? else {
        return Ok(());
    };
    let result = ctx
        .data()
        .music
        .stop(guild_id)
        .await
        .map(|()| embedded_messages::stopped());
    respond(ctx, result).await
}

async fn clear(ctx: Context<'_>, guild_id: GuildId) -> MusicResult<poise::CreateReply> {
    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::QueueEmpty)?;
    let cleared = player.lock().await.scheduler.queue_mut()?.clear();
    Ok(embedded_messages::queue_cleared(cleared))
}

/// Who may vote and whether there is anything to vote about.
async fn eligible_voters(
    ctx: Context<'_>,
    needs_playback: bool,
) -> MusicResult<(GuildId, Vec<UserId>)> {
    let (guild_id, _call) = checks::same_channel_with_bot(ctx).await?;
    let serenity_ctx = ctx.serenity_context();

    let player = ctx
        .data()
        .music
        .players
        .get(guild_id)
        .ok_or(MusicError::NothingPlaying)?;
    {
        let player = player.lock().await;
        if needs_playback && player.current_metadata().is_none() {
            return Err(MusicError::NothingPlaying);
        }
        if !needs_playback && player.scheduler.queue()?.is_empty() {
            return Err(MusicError::QueueEmpty);
        }
    }

    let channel_id = MusicManager::get_user_voice_channel(serenity_ctx, guild_id, ctx.author().id)?;
    let listeners = MusicManager::listeners_in_channel(serenity_ctx, guild_id, channel_id);
    Ok((guild_id, listeners))
}

/// Run a vote for `action` among the listeners. Returns the guild when it passed.
async fn hold_vote(
    ctx: Context<'_>,
    action: &str,
    needs_playback: bool,
) -> Result<Option<GuildId>, Error> {
    let (guild_id, listeners) = match eligible_voters(ctx, needs_playback).await {
        Ok(voters) => voters,
        Err(err) => {
            ctx.send(embedded_messages::error(err)).await?;
            return Ok(None);
        }
    };

    let settings = ctx.data().settings(guild_id);
    let outcome = run_vote(
        ctx,
        action,
        listeners,
        settings.vote_ratio,
        settings.vote_timeout,
    )
    .await?;

    info!(
        "Vote to {} in guild {} started by {}: {:?}",
        action,
        guild_id,
        ctx.author().name,
        outcome
    );
    Ok((outcome == VoteOutcome::Passed).then_some(guild_id))
}
