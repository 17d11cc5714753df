use std::sync::Arc;

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use tracing::{debug, error, info};

use super::music_manager::{MusicError, MusicManager, Playback};

/// Event handler for when a track ends or errors out
pub struct TrackEndNotifier {
    pub ctx: serenity::Context,
    pub guild_id: serenity::GuildId,
    pub call: Arc<serenity::prelude::Mutex<songbird::Call>>,
    pub manager: MusicManager,
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(tracks) = ctx {
            for (_, handle) in tracks.iter() {
                self.handle_track_end(handle).await;
            }
        }
        None
    }
}

impl TrackEndNotifier {
    async fn handle_track_end(&self, handle: &songbird::tracks::TrackHandle) {
        match self
            .manager
            .advance_after(&self.ctx, self.guild_id, Arc::clone(&self.call), handle)
            .await
        {
            Ok(Playback::Started(metadata)) => debug!("Advanced to '{}'", metadata.title),
            Ok(Playback::Finished) => info!("Queue finished for guild {}", self.guild_id),
            Ok(Playback::Busy) => {}
            Err(MusicError::NotConnected) => {
                debug!("Track ended after player for guild {} was dropped", self.guild_id)
            }
            Err(e) => error!(
                "Failed to play next track for guild {}: {}",
                self.guild_id, e
            ),
        }
    }
}
