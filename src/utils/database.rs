//! Provides functions for interacting with the application's SQLite database.
//! Handles table creation, per-guild statistics counters and per-guild settings.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, params};
use serenity::model::id::GuildId;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

use super::config::GuildDefaults;

/// Counters tracked for every guild the bot is active in.
#[derive(Debug, Clone, PartialEq)]
pub struct GuildStats {
    pub messages_deleted: u64,
    pub reactions_deleted: u64,
    pub tracks_played: u64,
    /// When the counters started (first increment or last reset).
    pub since: DateTime<Utc>,
}

/// Per-guild overrides of the configured [`GuildDefaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct GuildSettings {
    pub dj_role: String,
    pub vote_ratio: f64,
    pub vote_timeout: Duration,
    pub default_volume: u8,
}

impl From<&GuildDefaults> for GuildSettings {
    fn from(defaults: &GuildDefaults) -> Self {
        Self {
            dj_role: defaults.dj_role.clone(),
            vote_ratio: defaults.vote_ratio,
            vote_timeout: defaults.vote_timeout,
            default_volume: defaults.default_volume,
        }
    }
}

/// Handle to the SQLite database shared by all commands and event handlers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (or creates) the database file and ensures the tables exist.
    pub fn open(path: impl AsRef<Path>) -> SqlResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened database at {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> SqlResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> SqlResult<Self> {
        create_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a half-applied statement behind.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn find_stats(&self, guild_id: GuildId) -> SqlResult<Option<GuildStats>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT messages_deleted, reactions_deleted, tracks_played, since
             FROM guild_stats WHERE guild_id = ?1",
            params![guild_id.get()],
            |row| {
                let since: String = row.get(3)?;
                Ok(GuildStats {
                    messages_deleted: row.get(0)?,
                    reactions_deleted: row.get(1)?,
                    tracks_played: row.get(2)?,
                    since: DateTime::parse_from_rfc3339(&since)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            },
        )
        .optional()
    }

    pub fn stats_exist(&self, guild_id: GuildId) -> SqlResult<bool> {
        let conn = self.conn();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM guild_stats WHERE guild_id = ?1)",
            params![guild_id.get()],
            |row| row.get(0),
        )
    }

    pub fn increase_deleted_messages(&self, guild_id: GuildId) -> SqlResult<()> {
        self.increment(guild_id, StatColumn::MessagesDeleted)
    }

    pub fn increase_deleted_reactions(&self, guild_id: GuildId) -> SqlResult<()> {
        self.increment(guild_id, StatColumn::ReactionsDeleted)
    }

    pub fn increase_tracks_played(&self, guild_id: GuildId) -> SqlResult<()> {
        self.increment(guild_id, StatColumn::TracksPlayed)
    }

    fn increment(&self, guild_id: GuildId, column: StatColumn) -> SqlResult<()> {
        let conn = self.conn();
        ensure_stats_row(&conn, guild_id)?;
        let sql = format!(
            "UPDATE guild_stats SET {col} = {col} + 1 WHERE guild_id = ?1",
            col = column.as_str()
        );
        conn.execute(&sql, params![guild_id.get()])?;
        debug!("Incremented {} for guild {}", column.as_str(), guild_id);
        Ok(())
    }

    /// Zeroes every counter for a guild and restarts its `since` timestamp.
    pub fn reset_stats(&self, guild_id: GuildId) -> SqlResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO guild_stats
                (guild_id, messages_deleted, reactions_deleted, tracks_played, since)
             VALUES (?1, 0, 0, 0, ?2)",
            params![guild_id.get(), Utc::now().to_rfc3339()],
        )?;
        info!("Reset statistics for guild {}", guild_id);
        Ok(())
    }

    /// Returns the guild's stored settings, or the configured defaults if it never saved any.
    pub fn guild_settings(
        &self,
        guild_id: GuildId,
        defaults: &GuildDefaults,
    ) -> SqlResult<GuildSettings> {
        let conn = self.conn();
        let stored = conn
            .query_row(
                "SELECT dj_role, vote_ratio, vote_timeout_secs, default_volume
                 FROM guild_settings WHERE guild_id = ?1",
                params![guild_id.get()],
                |row| {
                    Ok(GuildSettings {
                        dj_role: row.get(0)?,
                        vote_ratio: row.get(1)?,
                        vote_timeout: Duration::from_secs(row.get(2)?),
                        default_volume: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(stored.unwrap_or_else(|| GuildSettings::from(defaults)))
    }

    pub fn save_settings(&self, guild_id: GuildId, settings: &GuildSettings) -> SqlResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO guild_settings
                (guild_id, dj_role, vote_ratio, vote_timeout_secs, default_volume)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                guild_id.get(),
                settings.dj_role,
                settings.vote_ratio,
                settings.vote_timeout.as_secs(),
                settings.default_volume
            ],
        )?;
        info!("Saved settings for guild {}", guild_id);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum StatColumn {
    MessagesDeleted,
    ReactionsDeleted,
    TracksPlayed,
}

impl StatColumn {
    fn as_str(self) -> &'static str {
        match self {
            StatColumn::MessagesDeleted => "messages_deleted",
            StatColumn::ReactionsDeleted => "reactions_deleted",
            StatColumn::TracksPlayed => "tracks_played",
        }
    }
}

fn ensure_stats_row(conn: &Connection, guild_id: GuildId) -> SqlResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO guild_stats
            (guild_id, messages_deleted, reactions_deleted, tracks_played, since)
         VALUES (?1, 0, 0, 0, ?2)",
        params![guild_id.get(), Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Creates the database tables (`guild_stats`, `guild_settings`) if they don't exist.
fn create_tables(conn: &Connection) -> SqlResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS guild_stats (
            guild_id INTEGER PRIMARY KEY,
            messages_deleted INTEGER NOT NULL DEFAULT 0,
            reactions_deleted INTEGER NOT NULL DEFAULT 0,
            tracks_played INTEGER NOT NULL DEFAULT 0,
            since TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS guild_settings (
            guild_id INTEGER PRIMARY KEY,
            dj_role TEXT NOT NULL,
            vote_ratio REAL NOT NULL,
            vote_timeout_secs INTEGER NOT NULL,
            default_volume INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup_db() -> Database {
        Database::open_in_memory().expect("Failed to open in-memory database")
    }

    #[test]
    fn test_increment_creates_row_on_first_use() {
        let db = setup_db();
        let guild_id = GuildId::new(111222333);

        assert!(!db.stats_exist(guild_id).unwrap());
        assert!(db.find_stats(guild_id).unwrap().is_none());

        db.increase_deleted_messages(guild_id).unwrap();

        assert!(db.stats_exist(guild_id).unwrap());
        let stats = db.find_stats(guild_id).unwrap().unwrap();
        assert_eq!(stats.messages_deleted, 1);
        assert_eq!(stats.reactions_deleted, 0);
        assert_eq!(stats.tracks_played, 0);
    }

    #[test]
    fn test_counters_are_independent_per_guild() {
        let db = setup_db();
        let first = GuildId::new(1);
        let second = GuildId::new(2);

        db.increase_deleted_reactions(first).unwrap();
        db.increase_deleted_reactions(first).unwrap();
        db.increase_tracks_played(second).unwrap();

        let first_stats = db.find_stats(first).unwrap().unwrap();
        let second_stats = db.find_stats(second).unwrap().unwrap();
        assert_eq!(first_stats.reactions_deleted, 2);
        assert_eq!(first_stats.tracks_played, 0);
        assert_eq!(second_stats.tracks_played, 1);
        assert_eq!(second_stats.reactions_deleted, 0);
    }

    #[test]
    fn test_reset_zeroes_counters() {
        let db = setup_db();
        let guild_id = GuildId::new(42);

        db.increase_deleted_messages(guild_id).unwrap();
        db.increase_tracks_played(guild_id).unwrap();
        db.reset_stats(guild_id).unwrap();

        let stats = db.find_stats(guild_id).unwrap().unwrap();
        assert_eq!(
            (stats.messages_deleted, stats.reactions_deleted, stats.tracks_played),
            (0, 0, 0)
        );
    }

    #[test]
    fn test_settings_fall_back_to_defaults() {
        let db = setup_db();
        let defaults = GuildDefaults::default();

        let settings = db.guild_settings(GuildId::new(7), &defaults).unwrap();

        assert_eq!(settings, GuildSettings::from(&defaults));
    }

    #[test]
    fn test_save_and_replace_settings() {
        let db = setup_db();
        let guild_id = GuildId::new(7);
        let defaults = GuildDefaults::default();

        let mut settings = GuildSettings::from(&defaults);
        settings.dj_role = "Maestro".to_string();
        settings.vote_timeout = Duration::from_secs(90);
        db.save_settings(guild_id, &settings).unwrap();
        assert_eq!(db.guild_settings(guild_id, &defaults).unwrap(), settings);

        settings.vote_ratio = 0.8;
        db.save_settings(guild_id, &settings).unwrap();
        assert_eq!(
            db.guild_settings(guild_id, &defaults).unwrap().vote_ratio,
            0.8
        );
    }

    #[test]
    fn test_tables_are_created_idempotently() {
        let db = setup_db();
        let conn = db.conn();
        create_tables(&conn).expect("second create_tables call should be a no-op");
    }
}
