use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{Call, Event, Songbird, TrackEvent};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::audio_sources::{AudioSource, TrackMetadata};
use super::event_handlers::TrackEndNotifier;
use super::inactivity::{IdleReason, InactivityMonitor};
use super::scheduler::Scheduler;
use crate::utils::config::RadioStation;
use crate::utils::database::Database;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("You must be in the same voice channel as the bot")]
    NotInSameChannel,

    #[error("Audio source error: {0}")]
    AudioSourceError(String),

    #[error("No track is currently playing")]
    NothingPlaying,

    #[error("The queue is empty")]
    QueueEmpty,

    #[error("The queue is full ({0} tracks)")]
    QueueFull(usize),

    #[error("Invalid position {position}, the queue has {len} tracks")]
    InvalidPosition { position: usize, len: usize },

    #[error("Repeat count must be between 1 and {max}")]
    InvalidRepeat { max: u32 },

    #[error("A radio station is playing, stop it with `/radio stop` first")]
    RadioActive,

    #[error("The track queue is playing, stop it before starting a radio station")]
    QueueActive,

    #[error("Unknown radio station '{0}'")]
    UnknownStation(String),

    #[error("Volume must be between 0 and {max}")]
    VolumeOutOfRange { max: u8 },

    #[error("Track control failed: {0}")]
    Track(String),
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// What starting playback did.
#[derive(Debug)]
pub enum Playback {
    /// A track is already playing; nothing was started.
    Busy,
    Started(TrackMetadata),
    /// The scheduler had nothing left.
    Finished,
}

/// Per-guild playback state: the active scheduler and the audio library's handle to
/// whatever is currently playing.
#[derive(Debug)]
pub struct GuildPlayer {
    pub scheduler: Scheduler,
    handle: Option<TrackHandle>,
    volume: u8,
    text_channel: ChannelId,
}

impl GuildPlayer {
    pub fn new(text_channel: ChannelId, volume: u8) -> Self {
        Self {
            scheduler: Scheduler::default(),
            handle: None,
            volume,
            text_channel,
        }
    }

    pub fn handle(&self) -> Option<&TrackHandle> {
        self.handle.as_ref()
    }

    /// Whether `handle` is the one this player is still driving.
    pub fn is_current(&self, handle: &TrackHandle) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|current| current.uuid() == handle.uuid())
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn text_channel(&self) -> ChannelId {
        self.text_channel
    }

    pub fn set_text_channel(&mut self, channel_id: ChannelId) {
        self.text_channel = channel_id;
    }

    pub fn set_volume(&mut self, volume: u8) -> MusicResult<()> {
        self.volume = volume;
        if let Some(handle) = &self.handle {
            handle
                .set_volume(volume_to_gain(volume))
                .map_err(|e| MusicError::Track(e.to_string()))?;
        }
        Ok(())
    }

    /// Stop the playing handle, if any. The track-end event it fires is ignored because
    /// the handle is no longer current.
    pub fn stop_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.stop() {
                debug!("Stopping track handle failed (already finished?): {}", e);
            }
        }
    }

    /// Metadata of whatever is playing: the current queue track, or the radio station.
    pub fn current_metadata(&self) -> Option<TrackMetadata> {
        if let Some(station) = self.scheduler.station() {
            return Some(TrackMetadata {
                title: station.name.clone(),
                url: station.website.clone(),
                ..Default::default()
            });
        }
        self.scheduler
            .queue()
            .ok()?
            .current()
            .map(|track| track.metadata.clone())
    }

    /// Playback position of the current handle.
    pub async fn position(&self) -> Option<std::time::Duration> {
        let handle = self.handle.as_ref()?;
        handle.get_info().await.ok().map(|info| info.position)
    }

    pub async fn play_mode(&self) -> Option<PlayMode> {
        let handle = self.handle.as_ref()?;
        handle.get_info().await.ok().map(|info| info.playing)
    }
}

fn volume_to_gain(volume: u8) -> f32 {
    f32::from(volume) / 100.0
}

/// All guild players, keyed by guild.
#[derive(Debug, Default)]
pub struct PlayerManager {
    players: DashMap<GuildId, Arc<Mutex<GuildPlayer>>>,
}

impl PlayerManager {
    pub fn get(&self, guild_id: GuildId) -> Option<Arc<Mutex<GuildPlayer>>> {
        self.players.get(&guild_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn get_or_create(
        &self,
        guild_id: GuildId,
        text_channel: ChannelId,
        volume: u8,
    ) -> Arc<Mutex<GuildPlayer>> {
        Arc::clone(
            self.players
                .entry(guild_id)
                .or_insert_with(|| {
                    info!("Creating player for guild {}", guild_id);
                    Arc::new(Mutex::new(GuildPlayer::new(text_channel, volume)))
                })
                .value(),
        )
    }

    /// The guild's player, provided it has a track or station loaded.
    pub async fn playing(&self, guild_id: GuildId) -> MusicResult<Arc<Mutex<GuildPlayer>>> {
        let player = self.get(guild_id).ok_or(MusicError::NothingPlaying)?;
        if player.lock().await.current_metadata().is_none() {
            return Err(MusicError::NothingPlaying);
        }
        Ok(player)
    }

    pub fn remove(&self, guild_id: GuildId) -> Option<Arc<Mutex<GuildPlayer>>> {
        self.players.remove(&guild_id).map(|(_, player)| player)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Shared music state: players, the idle tracker, and the statistics store.
#[derive(Clone)]
pub struct MusicManager {
    pub players: Arc<PlayerManager>,
    pub inactivity: Arc<InactivityMonitor>,
    database: Arc<Database>,
}

impl MusicManager {
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            players: Arc::new(PlayerManager::default()),
            inactivity: Arc::new(InactivityMonitor::default()),
            database,
        }
    }

    /// Get the Songbird voice client from the context
    pub async fn get_songbird(ctx: &Context) -> MusicResult<Arc<Songbird>> {
        songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)
    }

    /// Get the current voice channel call handle
    pub async fn get_call(
        ctx: &Context,
        guild_id: GuildId,
    ) -> MusicResult<Arc<SerenityMutex<Call>>> {
        let songbird = Self::get_songbird(ctx).await?;
        songbird.get(guild_id).ok_or(MusicError::NotConnected)
    }

    /// Join a voice channel, or move to it if already connected elsewhere in the guild
    pub async fn join_channel(
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Arc<SerenityMutex<Call>>> {
        let songbird = Self::get_songbird(ctx).await?;

        let handle = songbird
            .join(guild_id, channel_id)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))?;

        info!("Joined voice channel {} in guild {}", channel_id, guild_id);
        Ok(handle)
    }

    /// Leave a voice channel
    pub async fn leave_channel(ctx: &Context, guild_id: GuildId) -> MusicResult<()> {
        let songbird = Self::get_songbird(ctx).await?;

        if songbird.get(guild_id).is_none() {
            return Err(MusicError::NotConnected);
        }

        songbird
            .remove(guild_id)
            .await
            .map_err(|_| MusicError::JoinError("Failed to leave voice channel".to_string()))?;

        info!("Left voice channel in guild {}", guild_id);
        Ok(())
    }

    /// Get the voice channel ID that the user is currently in
    pub fn get_user_voice_channel(
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
    ) -> MusicResult<ChannelId> {
        let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

        guild
            .voice_states
            .get(&user_id)
            .and_then(|voice_state| voice_state.channel_id)
            .ok_or(MusicError::UserNotInVoiceChannel)
    }

    /// Get the voice channel the bot currently sits in
    pub fn get_bot_voice_channel(ctx: &Context, guild_id: GuildId) -> MusicResult<ChannelId> {
        let bot_id = ctx.cache.current_user().id;
        Self::get_user_voice_channel(ctx, guild_id, bot_id).map_err(|_| MusicError::NotConnected)
    }

    /// Non-bot users currently in `channel_id`
    pub fn listeners_in_channel(
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Vec<UserId> {
        let bot_id = ctx.cache.current_user().id;
        let Some(guild) = ctx.cache.guild(guild_id) else {
            return Vec::new();
        };

        guild
            .voice_states
            .values()
            .filter(|voice_state| voice_state.channel_id == Some(channel_id))
            .filter(|voice_state| voice_state.user_id != bot_id)
            .filter(|voice_state| {
                !voice_state
                    .member
                    .as_ref()
                    .is_some_and(|member| member.user.bot)
            })
            .map(|voice_state| voice_state.user_id)
            .collect()
    }

    /// Ensure the bot is in the user's channel, joining it when not connected yet.
    pub async fn connect_with_user(
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
    ) -> MusicResult<Arc<SerenityMutex<Call>>> {
        let user_channel = Self::get_user_voice_channel(ctx, guild_id, user_id)?;

        match Self::get_call(ctx, guild_id).await {
            Ok(call) => {
                let bot_channel = call.lock().await.current_channel();
                match bot_channel {
                    Some(channel) if channel.0.get() == user_channel.get() => Ok(call),
                    Some(_) => Err(MusicError::NotInSameChannel),
                    None => Self::join_channel(ctx, guild_id, user_channel).await,
                }
            }
            Err(_) => Self::join_channel(ctx, guild_id, user_channel).await,
        }
    }

    /// Start the next track, but only when nothing is playing yet. The idle check and the
    /// start happen under one player lock, so concurrent callers start a single track.
    pub async fn start_if_idle(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        call: Arc<SerenityMutex<Call>>,
    ) -> MusicResult<Playback> {
        let player = self.players.get(guild_id).ok_or(MusicError::NotConnected)?;
        let mut player = player.lock().await;
        if player.handle.is_some() {
            return Ok(Playback::Busy);
        }
        self.play_next(ctx, guild_id, call, &mut player).await
    }

    /// Move on from `ended`, unless it was already replaced by stop, skip-to or the radio.
    pub async fn advance_after(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        call: Arc<SerenityMutex<Call>>,
        ended: &TrackHandle,
    ) -> MusicResult<Playback> {
        let player = self.players.get(guild_id).ok_or(MusicError::NotConnected)?;
        let mut player = player.lock().await;
        if !player.is_current(ended) {
            debug!("Ignoring end of a stale track in guild {}", guild_id);
            return Ok(Playback::Busy);
        }
        self.play_next(ctx, guild_id, call, &mut player).await
    }

    /// Start the next track the scheduler picks. The guild is marked idle when nothing
    /// follows or nothing playable is left.
    async fn play_next(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        call: Arc<SerenityMutex<Call>>,
        player: &mut GuildPlayer,
    ) -> MusicResult<Playback> {
        player.stop_handle();

        let (track, input) = match player
            .scheduler
            .advance_playable(|track| AudioSource::input_for(&track.metadata))
        {
            Ok(Some(opened)) => opened,
            Ok(None) => {
                if player.scheduler.stop_radio().is_some() {
                    info!("Radio stream ended for guild {}", guild_id);
                }
                info!("Nothing left to play for guild {}", guild_id);
                self.inactivity.mark_idle(guild_id, IdleReason::NotPlaying);
                return Ok(Playback::Finished);
            }
            Err(e) => {
                self.inactivity.mark_idle(guild_id, IdleReason::NotPlaying);
                return Err(e);
            }
        };

        let handle = call.lock().await.play_input(input);
        self.attach(ctx, guild_id, &call, player, handle);
        info!("Now playing '{}' in guild {}", track.metadata.title, guild_id);

        if let Err(e) = self.database.increase_tracks_played(guild_id) {
            error!("Failed to record played track for guild {}: {}", guild_id, e);
        }
        Ok(Playback::Started(track.metadata))
    }

    /// Mark a connected guild as not playing unless a track is loaded.
    pub async fn mark_idle_if_silent(&self, guild_id: GuildId) {
        match self.players.get(guild_id) {
            Some(player) => {
                // Held while marking so a track starting concurrently clears the mark after.
                let player = player.lock().await;
                if player.handle.is_none() {
                    self.inactivity.mark_idle(guild_id, IdleReason::NotPlaying);
                }
            }
            None => self.inactivity.mark_idle(guild_id, IdleReason::NotPlaying),
        }
    }

    /// Switch the guild to radio mode and start streaming `station`.
    pub async fn play_radio(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        call: Arc<SerenityMutex<Call>>,
        station: RadioStation,
    ) -> MusicResult<()> {
        let player = self.players.get(guild_id).ok_or(MusicError::NotConnected)?;
        let mut player = player.lock().await;

        let input = AudioSource::radio_input(&station);
        player.scheduler.start_radio(station)?;
        player.stop_handle();

        let handle = call.lock().await.play_input(input);
        self.attach(ctx, guild_id, &call, &mut player, handle);
        Ok(())
    }

    fn attach(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        call: &Arc<SerenityMutex<Call>>,
        player: &mut GuildPlayer,
        handle: TrackHandle,
    ) {
        if let Err(e) = handle.set_volume(volume_to_gain(player.volume)) {
            warn!("Failed to apply volume for guild {}: {}", guild_id, e);
        }

        for event in [TrackEvent::End, TrackEvent::Error] {
            let notifier = TrackEndNotifier {
                ctx: ctx.clone(),
                guild_id,
                call: Arc::clone(call),
                manager: self.clone(),
            };
            if let Err(e) = handle.add_event(Event::Track(event), notifier) {
                error!("Failed to register track event for guild {}: {}", guild_id, e);
            }
        }

        player.handle = Some(handle);
        self.inactivity.mark_active(guild_id);
    }

    /// Skip the current queue track, ignoring its loop and repeat state.
    pub async fn skip(&self, guild_id: GuildId) -> MusicResult<TrackMetadata> {
        let player = self.players.get(guild_id).ok_or(MusicError::NothingPlaying)?;
        let mut player = player.lock().await;
        let skipped = player
            .scheduler
            .queue_mut()?
            .skip()
            .map(|track| track.metadata.clone())
            .ok_or(MusicError::NothingPlaying)?;

        // The track-end notifier starts whatever comes next.
        if let Some(handle) = player.handle() {
            handle.stop().map_err(|e| MusicError::Track(e.to_string()))?;
        }
        Ok(skipped)
    }

    /// Jump to the upcoming track at `position` (1-based) by ending the current one.
    pub async fn skip_to(&self, guild_id: GuildId, position: usize) -> MusicResult<TrackMetadata> {
        let player = self.players.get(guild_id).ok_or(MusicError::NothingPlaying)?;
        let mut player = player.lock().await;
        let target = player
            .scheduler
            .queue_mut()?
            .skip_to(position)?
            .metadata
            .clone();

        if let Some(handle) = player.handle() {
            handle.stop().map_err(|e| MusicError::Track(e.to_string()))?;
        }
        Ok(target)
    }

    /// Stop playback and drop the queue, staying connected.
    pub async fn stop(&self, guild_id: GuildId) -> MusicResult<()> {
        let player = self.players.get(guild_id).ok_or(MusicError::NothingPlaying)?;
        let mut player = player.lock().await;
        match player.scheduler.queue_mut() {
            Ok(queue) => queue.reset(),
            Err(_) => {
                player.scheduler.stop_radio();
            }
        }
        player.stop_handle();
        self.inactivity.mark_idle(guild_id, IdleReason::NotPlaying);
        Ok(())
    }

    /// Stop the radio stream and return to queue mode.
    pub async fn stop_radio(&self, guild_id: GuildId) -> MusicResult<RadioStation> {
        let player = self.players.get(guild_id).ok_or(MusicError::NothingPlaying)?;
        let mut player = player.lock().await;
        let station = player
            .scheduler
            .stop_radio()
            .ok_or(MusicError::NothingPlaying)?;
        player.stop_handle();
        self.inactivity.mark_idle(guild_id, IdleReason::NotPlaying);
        Ok(station)
    }

    pub async fn pause(&self, guild_id: GuildId) -> MusicResult<()> {
        let player = self.players.get(guild_id).ok_or(MusicError::NothingPlaying)?;
        let player = player.lock().await;
        let handle = player.handle().ok_or(MusicError::NothingPlaying)?;
        handle.pause().map_err(|e| MusicError::Track(e.to_string()))?;
        self.inactivity.mark_idle(guild_id, IdleReason::NotPlaying);
        Ok(())
    }

    pub async fn resume(&self, guild_id: GuildId) -> MusicResult<()> {
        let player = self.players.get(guild_id).ok_or(MusicError::NothingPlaying)?;
        let player = player.lock().await;
        let handle = player.handle().ok_or(MusicError::NothingPlaying)?;
        handle.play().map_err(|e| MusicError::Track(e.to_string()))?;
        self.inactivity.mark_active(guild_id);
        Ok(())
    }

    /// Stop everything, leave the voice channel and forget the guild's player.
    /// Returns the text channel the player was reporting to.
    pub async fn disconnect(&self, ctx: &Context, guild_id: GuildId) -> Option<ChannelId> {
        let text_channel = match self.players.remove(guild_id) {
            Some(player) => {
                let mut player = player.lock().await;
                player.stop_handle();
                Some(player.text_channel())
            }
            None => None,
        };
        self.inactivity.forget(guild_id);

        if let Err(e) = Self::leave_channel(ctx, guild_id).await {
            debug!("Leaving voice in guild {} during disconnect: {}", guild_id, e);
        }
        text_channel
    }
}
