use anyhow::{bail, Result};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use super::probit::{rating_percentile, stars_from_percentile};
use super::resolver::expected_score;
use super::store::RatingStore;
use super::types::{MatchEntry, MatchMode, MovieKey, RatingValue, DEFAULT_RATING};
use crate::config::settings::PlacementSettings;

/// One submitted vote inside a placement session.
#[derive(Debug, Clone)]
pub struct PlacementOutcome {
    pub opponent: MovieKey,
    pub opponent_rating: RatingValue,
    pub candidate_won: bool,
    /// Candidate's pre-vote win probability
    pub p_win: f64,
    /// Delta applied to the working rating
    pub delta: i32,
}

/// Result summary shown when the session finishes. Presentation only; the
/// store is untouched until `save`.
#[derive(Debug, Clone)]
pub struct PlacementSummary {
    pub working_rating: RatingValue,
    pub projected_rank: usize,
    pub projected_stars: f64,
    pub wins: u32,
    pub losses: u32,
}

/// A provisional-rating session for an item with no match history.
///
/// The candidate plays a fixed series against a stratified-plus-random
/// opponent sample with a temporary high K, touching only its own working
/// rating. Saving commits the result; dropping the session discards it.
#[derive(Debug)]
pub struct PlacementSession {
    key: MovieKey,
    pub title: String,
    pub year: Option<i32>,
    working_rating: RatingValue,
    opponents: Vec<MovieKey>,
    cursor: usize,
    wins: u32,
    losses: u32,
    outcomes: Vec<PlacementOutcome>,
}

impl PlacementSession {
    /// Start a session for (title, year).
    ///
    /// `csv_mean_rating` is the mean 0-10 source rating of the loaded
    /// dataset, used to derive a seed when the store is empty. Callers
    /// surface the small-pool precondition before invoking; it is enforced
    /// here as well.
    pub fn start(
        title: &str,
        year: Option<i32>,
        store: &RatingStore,
        csv_mean_rating: Option<f64>,
        settings: &PlacementSettings,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if store.len() < settings.min_pool {
            bail!(
                "Need at least {} rated movies before a placement session can run",
                settings.min_pool
            );
        }

        let key = crate::domain::models::movie_key(title, year);
        let working_rating = initial_rating(store, csv_mean_rating);

        let stratified = pick_stratified_opponents(store, &key, settings.stratified_count, rng);
        let mut exclude: HashSet<MovieKey> = stratified.iter().cloned().collect();
        exclude.insert(key.clone());
        let randoms = pick_random_opponents(store, &exclude, settings.random_count, rng);

        let mut opponents: Vec<MovieKey> = stratified.into_iter().chain(randoms).collect();
        opponents.shuffle(rng);

        Ok(Self {
            key,
            title: title.trim().to_string(),
            year,
            working_rating,
            opponents,
            cursor: 0,
            wins: 0,
            losses: 0,
            outcomes: Vec::new(),
        })
    }

    pub fn key(&self) -> &MovieKey {
        &self.key
    }

    pub fn working_rating(&self) -> RatingValue {
        self.working_rating
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.cursor, self.opponents.len())
    }

    pub fn current_opponent(&self) -> Option<&MovieKey> {
        self.opponents.get(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.opponents.len()
    }

    pub fn opponents(&self) -> &[MovieKey] {
        &self.opponents
    }

    pub fn outcomes(&self) -> &[PlacementOutcome] {
        &self.outcomes
    }

    /// Apply a vote for the opponent at the cursor. Only the session's
    /// working rating moves; the opponent's stored rating stays untouched.
    pub fn vote(&mut self, candidate_won: bool, store: &RatingStore, settings: &PlacementSettings) -> Result<()> {
        if self.is_finished() {
            bail!("Placement session already finished");
        }

        let opponent = self.opponents[self.cursor].clone();
        let opponent_rating = store
            .rating_of(&opponent)
            .unwrap_or_else(|| store.mean_rating().unwrap_or(DEFAULT_RATING));

        let p_win = expected_score(self.working_rating, opponent_rating);
        let actual = if candidate_won { 1.0 } else { 0.0 };
        let before = self.working_rating;
        self.working_rating = (self.working_rating as f64
            + settings.session_k as f64 * (actual - p_win))
            .round() as RatingValue;

        self.outcomes.push(PlacementOutcome {
            opponent,
            opponent_rating,
            candidate_won,
            p_win,
            delta: self.working_rating - before,
        });
        if candidate_won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.cursor += 1;

        Ok(())
    }

    /// Projected rank and star estimate against the current pool.
    pub fn summary(&self, store: &RatingStore, settings: &PlacementSettings) -> PlacementSummary {
        let values: Vec<RatingValue> = store.rated_keys().map(|k| store.get(k)).collect();

        // Equal stored ratings rank ahead of the candidate
        let projected_rank = values.iter().filter(|&&v| v >= self.working_rating).count() + 1;

        let p = rating_percentile(&values, self.working_rating);
        let projected_stars = stars_from_percentile(p, settings.star_mu, settings.star_sigma);

        PlacementSummary {
            working_rating: self.working_rating,
            projected_rank,
            projected_stars,
            wins: self.wins,
            losses: self.losses,
        }
    }

    /// Commit the session into the store.
    ///
    /// A new key gets the working rating plus the session tallies. An
    /// existing key gets only its rating overwritten; its permanent win/loss
    /// counters are preserved so session games are not double-counted.
    /// Every session outcome is replayed into the match history as a
    /// provisional entry with unknown pre-match ratings.
    pub fn save(self, store: &mut RatingStore) {
        if !store.contains(&self.key) {
            store.set_rating(&self.key, self.working_rating);
            store.set_counters(&self.key, self.wins, self.losses);
        } else {
            store.set_rating(&self.key, self.working_rating);
        }

        let now = Utc::now();
        for outcome in &self.outcomes {
            let (winner, loser) = if outcome.candidate_won {
                (self.key.clone(), outcome.opponent.clone())
            } else {
                (outcome.opponent.clone(), self.key.clone())
            };
            store.push_history(MatchEntry {
                timestamp: now,
                winner,
                loser,
                winner_before: None,
                loser_before: None,
                delta_winner: if outcome.candidate_won { outcome.delta } else { 0 },
                delta_loser: if outcome.candidate_won { 0 } else { outcome.delta },
                p_winner: if outcome.candidate_won {
                    outcome.p_win
                } else {
                    1.0 - outcome.p_win
                },
                mode: MatchMode::Provisional,
            });
        }

        // Key set may have changed; a stale baseline is repaired here
        store.ensure_baseline();
    }
}

fn initial_rating(store: &RatingStore, csv_mean_rating: Option<f64>) -> RatingValue {
    if let Some(mean) = store.mean_rating() {
        return mean;
    }
    if let Some(avg) = csv_mean_rating.filter(|a| a.is_finite()) {
        return (1000.0 + 50.0 * (avg - 5.0)).round() as RatingValue;
    }
    DEFAULT_RATING
}

/// Sample opponents from the top-20%/middle-20%/bottom-20% rating bands of
/// the descending leaderboard, roughly a third of the request from each.
fn pick_stratified_opponents(
    store: &RatingStore,
    candidate: &str,
    n: usize,
    rng: &mut impl Rng,
) -> Vec<MovieKey> {
    let rows: Vec<MovieKey> = store
        .ranked_keys()
        .into_iter()
        .map(|(key, _)| key)
        .filter(|key| key != candidate)
        .collect();
    if rows.is_empty() {
        return Vec::new();
    }

    let len = rows.len();
    let take = n.min(len);
    let thirds = (take / 3).max(1);

    let top = &rows[..(len / 5).max(1)];
    let mid = &rows[(len * 2) / 5..(len * 3) / 5];
    let bot = &rows[(len * 4) / 5..];

    let mut picked = sample_without_replacement(top, thirds, rng);
    picked.extend(sample_without_replacement(mid, thirds, rng));
    picked.extend(sample_without_replacement(
        bot,
        take.saturating_sub(2 * thirds),
        rng,
    ));

    // Dedup preserving order, then trim to the request
    let mut seen = HashSet::new();
    picked.retain(|key| seen.insert(key.clone()));
    picked.truncate(take);
    picked
}

fn pick_random_opponents(
    store: &RatingStore,
    exclude: &HashSet<MovieKey>,
    n: usize,
    rng: &mut impl Rng,
) -> Vec<MovieKey> {
    let mut all: Vec<MovieKey> = store
        .rated_keys()
        .filter(|key| !exclude.contains(*key))
        .cloned()
        .collect();
    all.sort();
    all.shuffle(rng);
    all.truncate(n);
    all
}

fn sample_without_replacement(pool: &[MovieKey], m: usize, rng: &mut impl Rng) -> Vec<MovieKey> {
    let target = m.min(pool.len());
    let mut used: HashSet<usize> = HashSet::new();
    let mut out = Vec::with_capacity(target);
    while out.len() < target {
        let idx = rng.random_range(0..pool.len());
        if used.insert(idx) {
            out.push(pool[idx].clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings() -> PlacementSettings {
        PlacementSettings::default()
    }

    fn store_of(n: usize) -> RatingStore {
        let mut store = RatingStore::new();
        for i in 0..n {
            store.seed(&format!("M{:02}_2000", i), (i % 11) as f64);
        }
        store
    }

    #[test]
    fn session_needs_five_rated_keys() {
        let store = store_of(4);
        let mut rng = StdRng::seed_from_u64(1);
        let result = PlacementSession::start("New", Some(2024), &store, None, &settings(), &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn full_pool_yields_twenty_distinct_opponents() {
        let store = store_of(40);
        let mut rng = StdRng::seed_from_u64(5);
        let session =
            PlacementSession::start("New", Some(2024), &store, None, &settings(), &mut rng).unwrap();

        assert_eq!(session.opponents().len(), 20);
        let unique: HashSet<&MovieKey> = session.opponents().iter().collect();
        assert_eq!(unique.len(), 20);
        assert!(!session.opponents().iter().any(|k| k == session.key()));
        assert!(session.opponents().iter().all(|k| store.contains(k)));
    }

    #[test]
    fn candidate_already_in_store_is_never_its_own_opponent() {
        let mut store = store_of(30);
        store.seed("New_2024", 9.0);
        let mut rng = StdRng::seed_from_u64(9);
        let session =
            PlacementSession::start("New", Some(2024), &store, None, &settings(), &mut rng).unwrap();

        assert!(!session.opponents().iter().any(|k| k == "New_2024"));
    }

    #[test]
    fn vote_moves_only_the_working_rating() {
        let mut store = RatingStore::new();
        for i in 0..6 {
            store.seed(&format!("M{}_2000", i), 5.0); // all at 1000
        }
        let mut rng = StdRng::seed_from_u64(2);
        let mut session =
            PlacementSession::start("New", Some(2024), &store, None, &settings(), &mut rng).unwrap();
        assert_eq!(session.working_rating(), 1000);

        let opponent = session.current_opponent().unwrap().clone();
        session.vote(true, &store, &settings()).unwrap();

        // Even odds at K=40: +20 for the candidate, opponent untouched
        assert_eq!(session.working_rating(), 1020);
        assert_eq!(store.get(&opponent), 1000);
        assert_eq!(store.games_played(&opponent), 0);

        let outcome = &session.outcomes()[0];
        assert_eq!(outcome.delta, 20);
        assert!((outcome.p_win - 0.5).abs() < 1e-12);
    }

    #[test]
    fn session_finishes_after_opponent_list_is_exhausted() {
        let store = store_of(25);
        let mut rng = StdRng::seed_from_u64(4);
        let mut session =
            PlacementSession::start("New", Some(2024), &store, None, &settings(), &mut rng).unwrap();

        let (_, total) = session.progress();
        for _ in 0..total {
            session.vote(true, &store, &settings()).unwrap();
        }
        assert!(session.is_finished());
        assert!(session.vote(true, &store, &settings()).is_err());
    }

    #[test]
    fn summary_ranks_ties_ahead_of_the_candidate() {
        let mut store = RatingStore::new();
        store.seed("A_2000", 9.0); // 1200
        store.seed("B_2000", 7.0); // 1100
        store.seed("C_2000", 5.0); // 1000
        store.seed("D_2000", 3.0); // 900
        store.seed("E_2000", 1.0); // 800
        let mut rng = StdRng::seed_from_u64(6);
        let session =
            PlacementSession::start("New", Some(2024), &store, None, &settings(), &mut rng).unwrap();

        // Working rating starts at the pool mean (1000): C ties, so the
        // candidate ranks behind A, B and C.
        let summary = session.summary(&store, &settings());
        assert_eq!(summary.working_rating, 1000);
        assert_eq!(summary.projected_rank, 4);
        assert!((0.5..=5.0).contains(&summary.projected_stars));
    }

    #[test]
    fn save_new_key_commits_rating_tallies_and_history() {
        let mut store = store_of(12);
        let mut rng = StdRng::seed_from_u64(8);
        let mut session =
            PlacementSession::start("New", Some(2024), &store, None, &settings(), &mut rng).unwrap();

        let (_, total) = session.progress();
        for i in 0..total {
            session.vote(i % 2 == 0, &store, &settings()).unwrap();
        }
        let expected_rating = session.working_rating();
        let history_before = store.history().len();

        session.save(&mut store);

        assert_eq!(store.get("New_2024"), expected_rating);
        assert_eq!(store.wins_of("New_2024") + store.losses_of("New_2024"), total as u32);
        let replayed = &store.history()[history_before..];
        assert_eq!(replayed.len(), total);
        assert!(replayed.iter().all(|e| e.mode == MatchMode::Provisional));
        assert!(replayed.iter().all(|e| e.winner_before.is_none() && e.loser_before.is_none()));
    }

    #[test]
    fn save_existing_key_overwrites_rating_but_keeps_counters() {
        let mut store = store_of(12);
        store.seed("New_2024", 5.0);
        store.set_counters("New_2024", 7, 3);
        let mut rng = StdRng::seed_from_u64(8);
        let mut session =
            PlacementSession::start("New", Some(2024), &store, None, &settings(), &mut rng).unwrap();

        let (_, total) = session.progress();
        for _ in 0..total {
            session.vote(true, &store, &settings()).unwrap();
        }
        let expected_rating = session.working_rating();
        session.save(&mut store);

        assert_eq!(store.get("New_2024"), expected_rating);
        assert_eq!(store.wins_of("New_2024"), 7);
        assert_eq!(store.losses_of("New_2024"), 3);
    }

    #[test]
    fn initial_rating_falls_back_to_csv_seed_then_default() {
        let store = RatingStore::new();
        assert_eq!(initial_rating(&store, Some(7.0)), 1100);
        assert_eq!(initial_rating(&store, None), 1000);
    }
}
