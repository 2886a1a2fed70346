use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Logical storage keys. One JSON document per key, mirroring the layout the
/// dashboard UI expects: plain lists and records, no binary formats.
pub mod keys {
    pub const RATINGS: &str = "eloRatings";
    pub const WINS: &str = "eloWins";
    pub const LOSSES: &str = "eloLosses";
    pub const HISTORY: &str = "eloHistory";
    pub const RECENT_PAIRS: &str = "eloRecentPairs";
    pub const BASELINE: &str = "eloBaseline";
    pub const CSV_DATA: &str = "csvData";
    pub const DATA_SOURCE: &str = "dataSource";
}

/// File-based key-value store for the engine's durable state
pub struct StateStore {
    data_dir: PathBuf,
}

impl StateStore {
    /// Create a new store rooted at `data_dir`
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        Ok(Self { data_dir })
    }

    /// Save data under a logical key
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let file_path = self.build_path(key);

        let json = serde_json::to_string_pretty(data).context("Failed to serialize state")?;

        fs::write(&file_path, json)
            .with_context(|| format!("Failed to write state file: {}", file_path.display()))?;

        Ok(())
    }

    /// Load data stored under a logical key
    pub fn load<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        let file_path = self.build_path(key);

        if !file_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read state file: {}", file_path.display()))?;

        let data = serde_json::from_str(&json).with_context(|| {
            format!(
                "Failed to parse JSON from {:?}. First 200 chars: {}",
                file_path,
                &json[..json.len().min(200)]
            )
        })?;

        Ok(Some(data))
    }

    /// Check if state exists for a key
    pub fn exists(&self, key: &str) -> bool {
        self.build_path(key).exists()
    }

    /// Remove a single key
    pub fn remove(&self, key: &str) -> Result<()> {
        let file_path = self.build_path(key);
        if file_path.exists() {
            fs::remove_file(&file_path).context("Failed to remove state file")?;
        }
        Ok(())
    }

    /// Clear all stored state
    pub fn clear(&self) -> Result<()> {
        fs::remove_dir_all(&self.data_dir).context("Failed to clear data directory")?;

        fs::create_dir_all(&self.data_dir).context("Failed to recreate data directory")?;

        info!("Cleared data directory");
        Ok(())
    }

    fn build_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> StateStore {
        let dir = std::env::temp_dir().join(format!("movie_elo_store_{}_{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        StateStore::new(&dir).unwrap()
    }

    #[test]
    fn save_load_round_trip() {
        let store = temp_store("roundtrip");
        let pairs: Vec<(String, i32)> = vec![("Heat_1995".into(), 1040), ("Alien_1979".into(), 987)];

        store.save(keys::RATINGS, &pairs).unwrap();
        let loaded: Vec<(String, i32)> = store.load(keys::RATINGS).unwrap().unwrap();

        assert_eq!(loaded, pairs);
    }

    #[test]
    fn load_missing_key_is_none() {
        let store = temp_store("missing");
        let loaded: Option<Vec<(String, i32)>> = store.load(keys::BASELINE).unwrap();
        assert!(loaded.is_none());
        assert!(!store.exists(keys::BASELINE));
    }

    #[test]
    fn remove_then_exists_is_false() {
        let store = temp_store("remove");
        store.save(keys::WINS, &vec![("A_2000".to_string(), 3u32)]).unwrap();
        assert!(store.exists(keys::WINS));
        store.remove(keys::WINS).unwrap();
        assert!(!store.exists(keys::WINS));
    }
}
