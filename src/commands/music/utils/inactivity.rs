//! Tracks how long each guild's voice connection has been idle and disconnects the ones that
//! overstay their timeout.

use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use serenity::all::CreateMessage;
use serenity::client::Context;
use serenity::model::id::GuildId;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::embedded_messages;
use super::music_manager::MusicManager;
use crate::utils::config::InactivityConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    /// Connected, but nothing is playing.
    NotPlaying,
    /// No listeners left in the bot's voice channel.
    Alone,
}

#[derive(Debug, Clone, Copy)]
struct IdleMark {
    since: Instant,
    reason: IdleReason,
}

#[derive(Debug, Default)]
pub struct InactivityMonitor {
    marks: DashMap<GuildId, IdleMark>,
}

impl InactivityMonitor {
    pub fn mark_idle(&self, guild_id: GuildId, reason: IdleReason) {
        self.mark_idle_at(guild_id, reason, Instant::now());
    }

    fn mark_idle_at(&self, guild_id: GuildId, reason: IdleReason, at: Instant) {
        let mut entry = self.marks.entry(guild_id).or_insert(IdleMark { since: at, reason });
        // An earlier mark for the same reason keeps counting; being alone trumps not playing.
        if entry.reason != reason && reason == IdleReason::Alone {
            *entry = IdleMark { since: at, reason };
        }
        debug!("Guild {} idle since {:?} ({:?})", guild_id, entry.since, entry.reason);
    }

    /// Playback started: only an `Alone` mark survives, listeners still have to come back.
    pub fn mark_active(&self, guild_id: GuildId) {
        self.marks
            .remove_if(&guild_id, |_, mark| mark.reason == IdleReason::NotPlaying);
    }

    /// Someone joined the bot's channel again.
    pub fn clear_alone(&self, guild_id: GuildId) {
        self.marks
            .remove_if(&guild_id, |_, mark| mark.reason == IdleReason::Alone);
    }

    pub fn forget(&self, guild_id: GuildId) {
        self.marks.remove(&guild_id);
    }

    pub fn reason(&self, guild_id: GuildId) -> Option<IdleReason> {
        self.marks.get(&guild_id).map(|mark| mark.reason)
    }

    /// Guilds whose idle mark is older than the timeout for its reason.
    pub fn expired(&self, now: Instant, config: &InactivityConfig) -> Vec<(GuildId, IdleReason)> {
        self.marks
            .iter()
            .filter(|entry| {
                let mark = entry.value();
                let timeout = match mark.reason {
                    IdleReason::NotPlaying => config.idle_timeout,
                    IdleReason::Alone => config.alone_timeout,
                };
                now.saturating_duration_since(mark.since) >= timeout
            })
            .map(|entry| (*entry.key(), entry.value().reason))
            .collect()
    }
}

/// Poll the monitor forever, disconnecting guilds that stayed idle too long.
pub fn spawn_poller(ctx: Context, manager: MusicManager, config: InactivityConfig) {
    info!(
        "Starting inactivity poller (idle {:?}, alone {:?}, every {:?})",
        config.idle_timeout, config.alone_timeout, config.poll_interval
    );

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            for (guild_id, reason) in manager.inactivity.expired(Instant::now(), &config) {
                info!("Disconnecting guild {} after inactivity ({:?})", guild_id, reason);

                let Some(text_channel) = manager.disconnect(&ctx, guild_id).await else {
                    continue;
                };

                let embed = embedded_messages::left_due_to_inactivity(reason);
                if let Err(e) = text_channel
                    .send_message(&ctx, CreateMessage::new().embed(embed))
                    .await
                {
                    warn!(
                        "Failed to post inactivity notice in channel {}: {}",
                        text_channel, e
                    );
                }
            }
        }
    });
}
