//! Common test utilities and fixtures shared by the integration tests

pub mod fixtures;

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use cadence::utils::database::Database;

/// A database file under the system temp dir that is removed on drop.
pub struct TempDatabase {
    pub path: PathBuf,
}

impl TempDatabase {
    pub fn new(label: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "cadence-{}-{}-{}.db",
            label,
            std::process::id(),
            nanos
        ));
        Self { path }
    }

    pub fn open(&self) -> Database {
        Database::open(&self.path).expect("Failed to open test database")
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_databases_get_distinct_paths() {
        let first = TempDatabase::new("a");
        let second = TempDatabase::new("a");
        assert_ne!(first.path, second.path);
    }
}
