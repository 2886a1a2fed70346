use anyhow::Result;
use std::collections::{HashMap, VecDeque};

use super::types::{LeaderboardRow, MatchEntry, MovieKey, RatingValue, DEFAULT_RATING};
use crate::domain::models::TitleIndex;
use crate::storage::{keys, StateStore};

/// Rematch check looks at the last N recorded pairs
const RECENT_PAIR_WINDOW: usize = 8;
/// FIFO cap on the recent-pair memory
const RECENT_PAIR_CAP: usize = 400;

/// The engine's mutable state: ratings, win/loss counters, the append-only
/// match history, recent-pair memory and the rank baseline. Constructed once
/// and passed by reference to every component.
#[derive(Debug, Default)]
pub struct RatingStore {
    ratings: HashMap<MovieKey, RatingValue>,
    wins: HashMap<MovieKey, u32>,
    losses: HashMap<MovieKey, u32>,
    history: Vec<MatchEntry>,
    recent_pairs: VecDeque<String>,
    baseline: Option<HashMap<MovieKey, usize>>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load persisted state, starting empty for any missing key.
    pub fn load(storage: &StateStore) -> Result<Self> {
        let ratings: Vec<(MovieKey, RatingValue)> =
            storage.load(keys::RATINGS)?.unwrap_or_default();
        let wins: Vec<(MovieKey, u32)> = storage.load(keys::WINS)?.unwrap_or_default();
        let losses: Vec<(MovieKey, u32)> = storage.load(keys::LOSSES)?.unwrap_or_default();
        let history: Vec<MatchEntry> = storage.load(keys::HISTORY)?.unwrap_or_default();
        let recent_pairs: Vec<String> = storage.load(keys::RECENT_PAIRS)?.unwrap_or_default();
        let baseline: Option<Vec<(MovieKey, usize)>> = storage.load(keys::BASELINE)?;

        Ok(Self {
            ratings: ratings.into_iter().collect(),
            wins: wins.into_iter().collect(),
            losses: losses.into_iter().collect(),
            history,
            recent_pairs: recent_pairs.into_iter().collect(),
            baseline: baseline.map(|pairs| pairs.into_iter().collect()),
        })
    }

    /// Write every logical key back to storage. Called after each mutating
    /// operation so a crash loses at most one match's update.
    pub fn persist(&self, storage: &StateStore) -> Result<()> {
        storage.save(keys::RATINGS, &self.sorted_pairs(&self.ratings))?;
        storage.save(keys::WINS, &self.sorted_pairs(&self.wins))?;
        storage.save(keys::LOSSES, &self.sorted_pairs(&self.losses))?;
        storage.save(keys::HISTORY, &self.history)?;
        storage.save(
            keys::RECENT_PAIRS,
            &self.recent_pairs.iter().cloned().collect::<Vec<_>>(),
        )?;
        match &self.baseline {
            Some(map) => storage.save(keys::BASELINE, &self.sorted_pairs(map))?,
            None => storage.remove(keys::BASELINE)?,
        }
        Ok(())
    }

    fn sorted_pairs<V: Clone>(&self, map: &HashMap<MovieKey, V>) -> Vec<(MovieKey, V)> {
        let mut pairs: Vec<(MovieKey, V)> =
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    // --- Ratings ---

    /// Seed a rating from a 0-10 source rating: round(1000 + (r - 5) * 50),
    /// i.e. 0 -> 750 and 10 -> 1250. Never overwrites; invalid input is a
    /// no-op.
    pub fn seed(&mut self, key: &str, source_rating: f64) {
        if !source_rating.is_finite() || self.ratings.contains_key(key) {
            return;
        }
        let seeded = (1000.0 + (source_rating - 5.0) * 50.0).round() as RatingValue;
        self.ratings.insert(key.to_string(), seeded);
    }

    /// Current rating, or the default (1000) for an absent key.
    pub fn get(&self, key: &str) -> RatingValue {
        self.ratings.get(key).copied().unwrap_or(DEFAULT_RATING)
    }

    /// Rating if the key is actually present.
    pub fn rating_of(&self, key: &str) -> Option<RatingValue> {
        self.ratings.get(key).copied()
    }

    pub fn set_rating(&mut self, key: &str, rating: RatingValue) {
        self.ratings.insert(key.to_string(), rating);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ratings.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn rated_keys(&self) -> impl Iterator<Item = &MovieKey> {
        self.ratings.keys()
    }

    pub fn mean_rating(&self) -> Option<RatingValue> {
        if self.ratings.is_empty() {
            return None;
        }
        let sum: i64 = self.ratings.values().map(|&r| r as i64).sum();
        Some((sum as f64 / self.ratings.len() as f64).round() as RatingValue)
    }

    // --- Counters ---

    pub fn wins_of(&self, key: &str) -> u32 {
        self.wins.get(key).copied().unwrap_or(0)
    }

    pub fn losses_of(&self, key: &str) -> u32 {
        self.losses.get(key).copied().unwrap_or(0)
    }

    pub fn games_played(&self, key: &str) -> u32 {
        self.wins_of(key) + self.losses_of(key)
    }

    pub fn record_win(&mut self, key: &str) {
        *self.wins.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn record_loss(&mut self, key: &str) {
        *self.losses.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn set_counters(&mut self, key: &str, wins: u32, losses: u32) {
        self.wins.insert(key.to_string(), wins);
        self.losses.insert(key.to_string(), losses);
    }

    // --- Match history ---

    pub fn push_history(&mut self, entry: MatchEntry) {
        self.history.push(entry);
    }

    pub fn history(&self) -> &[MatchEntry] {
        &self.history
    }

    // --- Recent-pair memory ---

    pub fn pair_fingerprint(a: &str, b: &str) -> String {
        if a <= b {
            format!("{}|{}", a, b)
        } else {
            format!("{}|{}", b, a)
        }
    }

    pub fn record_recent_pair(&mut self, a: &str, b: &str) {
        self.recent_pairs.push_back(Self::pair_fingerprint(a, b));
        while self.recent_pairs.len() > RECENT_PAIR_CAP {
            self.recent_pairs.pop_front();
        }
    }

    pub fn was_recently_paired(&self, a: &str, b: &str) -> bool {
        let fp = Self::pair_fingerprint(a, b);
        self.recent_pairs
            .iter()
            .rev()
            .take(RECENT_PAIR_WINDOW)
            .any(|p| *p == fp)
    }

    // --- Baseline (rank deltas) ---

    /// Keys ordered the way the leaderboard ranks them: rating descending,
    /// key ascending on ties.
    pub fn ranked_keys(&self) -> Vec<(MovieKey, RatingValue)> {
        let mut rows: Vec<(MovieKey, RatingValue)> = self
            .ratings
            .iter()
            .map(|(k, &r)| (k.clone(), r))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows
    }

    fn set_baseline_from_current(&mut self) {
        let map: HashMap<MovieKey, usize> = self
            .ranked_keys()
            .into_iter()
            .enumerate()
            .map(|(i, (key, _))| (key, i + 1))
            .collect();
        self.baseline = Some(map);
    }

    /// Make sure the baseline snapshot covers exactly the current key set,
    /// regenerating it from current ratings otherwise. Idempotent.
    pub fn ensure_baseline(&mut self) -> &HashMap<MovieKey, usize> {
        let stale = match &self.baseline {
            None => true,
            Some(base) => {
                base.len() != self.ratings.len()
                    || self.ratings.keys().any(|k| !base.contains_key(k))
            }
        };
        if stale {
            self.set_baseline_from_current();
        }
        self.baseline.as_ref().expect("baseline set above")
    }

    // --- Leaderboard ---

    pub fn leaderboard(&mut self, titles: &TitleIndex) -> Vec<LeaderboardRow> {
        let ranked = self.ranked_keys();
        let baseline = self.ensure_baseline().clone();

        ranked
            .into_iter()
            .enumerate()
            .map(|(i, (key, rating))| {
                let rank = i + 1;
                let rank_delta = baseline
                    .get(&key)
                    .map(|&base| base as i32 - rank as i32)
                    .unwrap_or(0);
                LeaderboardRow {
                    rank,
                    title: titles.display_name(&key),
                    rating,
                    rank_delta,
                    wins: self.wins_of(&key),
                    losses: self.losses_of(&key),
                    key,
                }
            })
            .collect()
    }

    // --- Reset ---

    /// Clear ratings, counters, history, recent pairs and the baseline.
    /// The caller re-seeds from the dataset and persists.
    pub fn reset(&mut self) {
        self.ratings.clear();
        self.wins.clear();
        self.losses.clear();
        self.history.clear();
        self.recent_pairs.clear();
        self.baseline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::types::MatchMode;
    use chrono::Utc;

    #[test]
    fn seed_maps_source_scale_and_never_overwrites() {
        let mut store = RatingStore::new();
        store.seed("A_2000", 0.0);
        store.seed("B_2000", 10.0);
        store.seed("C_2000", 7.0);
        assert_eq!(store.get("A_2000"), 750);
        assert_eq!(store.get("B_2000"), 1250);
        assert_eq!(store.get("C_2000"), 1100);

        store.seed("A_2000", 10.0);
        assert_eq!(store.get("A_2000"), 750);

        store.seed("D_2000", f64::NAN);
        assert!(!store.contains("D_2000"));
        assert_eq!(store.get("D_2000"), 1000);
    }

    #[test]
    fn recent_pair_memory_is_unordered_windowed_and_capped() {
        let mut store = RatingStore::new();
        store.record_recent_pair("A", "B");
        assert!(store.was_recently_paired("B", "A"));

        // Push the A|B pair out of the 8-entry window
        for i in 0..8 {
            store.record_recent_pair("X", &format!("Y{}", i));
        }
        assert!(!store.was_recently_paired("A", "B"));

        for i in 0..500 {
            store.record_recent_pair("P", &format!("Q{}", i));
        }
        assert_eq!(store.recent_pairs.len(), 400);
    }

    #[test]
    fn ensure_baseline_is_idempotent() {
        let mut store = RatingStore::new();
        store.seed("A_2000", 8.0);
        store.seed("B_2000", 6.0);
        store.seed("C_2000", 7.0);

        let first = store.ensure_baseline().clone();
        let second = store.ensure_baseline().clone();
        assert_eq!(first, second);
        assert_eq!(first.get("A_2000"), Some(&1));
        assert_eq!(first.get("C_2000"), Some(&2));
        assert_eq!(first.get("B_2000"), Some(&3));
    }

    #[test]
    fn baseline_regenerates_on_key_set_change() {
        let mut store = RatingStore::new();
        store.seed("A_2000", 8.0);
        store.ensure_baseline();

        store.seed("B_2000", 9.0);
        let base = store.ensure_baseline().clone();
        assert_eq!(base.len(), 2);
        assert_eq!(base.get("B_2000"), Some(&1));
    }

    #[test]
    fn persist_then_load_reproduces_state() {
        let dir = std::env::temp_dir().join(format!("movie_elo_rt_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let storage = StateStore::new(&dir).unwrap();

        let mut store = RatingStore::new();
        store.seed("A_2000", 8.0);
        store.seed("B_2001", 4.0);
        store.record_win("A_2000");
        store.record_loss("B_2001");
        store.record_recent_pair("A_2000", "B_2001");
        store.push_history(MatchEntry {
            timestamp: Utc::now(),
            winner: "A_2000".into(),
            loser: "B_2001".into(),
            winner_before: Some(1150),
            loser_before: Some(950),
            delta_winner: 8,
            delta_loser: -8,
            p_winner: 0.759747,
            mode: MatchMode::Regular,
        });
        store.ensure_baseline();
        store.persist(&storage).unwrap();

        let loaded = RatingStore::load(&storage).unwrap();
        assert_eq!(loaded.get("A_2000"), store.get("A_2000"));
        assert_eq!(loaded.get("B_2001"), store.get("B_2001"));
        assert_eq!(loaded.wins_of("A_2000"), 1);
        assert_eq!(loaded.losses_of("B_2001"), 1);
        assert_eq!(loaded.history().len(), 1);
        assert!(loaded.was_recently_paired("A_2000", "B_2001"));
        assert_eq!(loaded.baseline, store.baseline);
    }
}
