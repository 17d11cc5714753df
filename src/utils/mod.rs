//! Configuration and persistence shared by every command.

/// Bot configuration loaded from a JSON file.
pub mod config;
/// Per-guild statistics and settings stored in SQLite.
pub mod database;
