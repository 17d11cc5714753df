//! Guards shared by the music commands.

use poise::serenity_prelude as serenity;
use serenity::model::id::GuildId;
use serenity::prelude::Mutex as SerenityMutex;
use songbird::Call;
use std::sync::Arc;
use tracing::debug;

use super::music_manager::{MusicError, MusicManager, MusicResult};
use crate::{Context, Error};

pub fn guild_id(ctx: Context<'_>) -> MusicResult<GuildId> {
    ctx.guild_id().ok_or(MusicError::NotInGuild)
}

/// The bot must be connected and the invoker must be listening in the same channel.
pub async fn same_channel_with_bot(
    ctx: Context<'_>,
) -> MusicResult<(GuildId, Arc<SerenityMutex<Call>>)> {
    let guild_id = guild_id(ctx)?;
    let serenity_ctx = ctx.serenity_context();

    let user_channel =
        MusicManager::get_user_voice_channel(serenity_ctx, guild_id, ctx.author().id)?;
    let call = MusicManager::get_call(serenity_ctx, guild_id).await?;

    let bot_channel = call.lock().await.current_channel();
    match bot_channel {
        Some(channel) if channel.0.get() == user_channel.get() => Ok((guild_id, call)),
        Some(_) => Err(MusicError::NotInSameChannel),
        None => Err(MusicError::NotConnected),
    }
}

/// poise check: the invoker holds the guild's DJ role, or may manage the guild.
pub async fn is_dj(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };
    let Some(member) = ctx.author_member().await else {
        return Ok(false);
    };
    let dj_role = ctx.data().settings(guild_id).dj_role;

    let allowed = match ctx.guild() {
        Some(guild) => {
            guild.owner_id == member.user.id
                || member.roles.iter().any(|role_id| {
                    guild.roles.get(role_id).is_some_and(|role| {
                        role.name.eq_ignore_ascii_case(&dj_role)
                            || role.has_permission(serenity::Permissions::ADMINISTRATOR)
                            || role.has_permission(serenity::Permissions::MANAGE_GUILD)
                    })
                })
        }
        None => false,
    };

    if !allowed {
        debug!(
            "{} lacks the '{}' role in guild {}",
            ctx.author().name,
            dj_role,
            guild_id
        );
        ctx.send(super::embedded_messages::error(format!(
            "You need the **{}** role to use this command",
            dj_role
        )))
        .await?;
    }
    Ok(allowed)
}
