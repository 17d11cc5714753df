//! End-to-end checks of the bot's building blocks

pub mod config;
pub mod playback;
pub mod storage;
