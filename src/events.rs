//! Gateway events the bot reacts to outside of commands.

use poise::serenity_prelude as serenity;
use tracing::{debug, info, warn};

use crate::{Data, Error};

#[cfg(feature = "music")]
use crate::commands::music::utils::{
    inactivity::{IdleReason, spawn_poller},
    music_manager::MusicManager,
};

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "{} is connected to {} guilds",
                data_about_bot.user.name,
                data_about_bot.guilds.len()
            );
            #[cfg(feature = "music")]
            start_background_tasks(ctx, data);
        }
        serenity::FullEvent::MessageDelete {
            guild_id: Some(guild_id),
            deleted_message_id,
            ..
        } => {
            debug!("Message {} deleted in guild {}", deleted_message_id, guild_id);
            if let Err(e) = data.database.increase_deleted_messages(*guild_id) {
                warn!("Failed to count deleted message in guild {}: {}", guild_id, e);
            }
        }
        serenity::FullEvent::ReactionRemove { removed_reaction } => {
            if let Some(guild_id) = removed_reaction.guild_id {
                if let Err(e) = data.database.increase_deleted_reactions(guild_id) {
                    warn!("Failed to count removed reaction in guild {}: {}", guild_id, e);
                }
            }
        }
        #[cfg(feature = "music")]
        serenity::FullEvent::VoiceStateUpdate { new, .. } => {
            voice_state_update(ctx, new, data);
        }
        _ => {}
    }
    Ok(())
}

/// Ready fires again after every reconnect; only the first one starts the poller.
#[cfg(feature = "music")]
fn start_background_tasks(ctx: &serenity::Context, data: &Data) {
    if data.claim_background_tasks() {
        spawn_poller(
            ctx.clone(),
            data.music.clone(),
            data.config.inactivity.clone(),
        );
    }
}

/// Keep players in step with the voice channel: forget them when the bot is kicked out,
/// and track whether anyone is left listening.
#[cfg(feature = "music")]
fn voice_state_update(ctx: &serenity::Context, new: &serenity::VoiceState, data: &Data) {
    let Some(guild_id) = new.guild_id else {
        return;
    };
    let bot_id = ctx.cache.current_user().id;

    if new.user_id == bot_id && new.channel_id.is_none() {
        if data.music.players.remove(guild_id).is_some() {
            info!("Disconnected from voice in guild {}, dropping its player", guild_id);
        }
        data.music.inactivity.forget(guild_id);
        return;
    }

    let Ok(bot_channel) = MusicManager::get_bot_voice_channel(ctx, guild_id) else {
        return;
    };
    if MusicManager::listeners_in_channel(ctx, guild_id, bot_channel).is_empty() {
        debug!("Bot is alone in {} (guild {})", bot_channel, guild_id);
        data.music.inactivity.mark_idle(guild_id, IdleReason::Alone);
    } else {
        data.music.inactivity.clear_alone(guild_id);
    }
}
