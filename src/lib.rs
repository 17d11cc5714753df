use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use poise::serenity_prelude as serenity;
use tracing::warn;

pub mod commands;
pub mod events;
pub mod utils;

#[cfg(feature = "music")]
use commands::music::utils::music_manager::MusicManager;
use utils::config::BotConfig;
use utils::database::{Database, GuildSettings};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// HTTP client shared by every audio source.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub config: Arc<BotConfig>,
    pub database: Arc<Database>,
    #[cfg(feature = "music")]
    pub music: MusicManager,
    poller_started: AtomicBool,
}

impl Data {
    pub fn new(config: BotConfig, database: Database) -> Self {
        let database = Arc::new(database);
        Self {
            config: Arc::new(config),
            #[cfg(feature = "music")]
            music: MusicManager::new(Arc::clone(&database)),
            database,
            poller_started: AtomicBool::new(false),
        }
    }

    /// The guild's settings, falling back to the configured defaults on database errors.
    pub fn settings(&self, guild_id: serenity::GuildId) -> GuildSettings {
        self.database
            .guild_settings(guild_id, &self.config.defaults)
            .unwrap_or_else(|e| {
                warn!("Failed to load settings for guild {}: {}", guild_id, e);
                GuildSettings::from(&self.config.defaults)
            })
    }

    /// True exactly once, for whoever should start the background tasks.
    pub fn claim_background_tasks(&self) -> bool {
        !self.poller_started.swap(true, Ordering::SeqCst)
    }
}
