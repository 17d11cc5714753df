//! Guild administration: statistics counters and per-guild settings.

pub mod settings;
pub mod stats;
