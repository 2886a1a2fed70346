use chrono::Utc;

use super::store::RatingStore;
use super::types::{MatchEntry, MatchMode, MovieKey, ResolveOutcome, SkipReason};
use crate::config::settings::EloSettings;

/// Logistic Elo expectation for `rating_a` against `rating_b`.
pub fn expected_score(rating_a: i32, rating_b: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) as f64 / 400.0))
}

/// Adaptive K: fresh items move fast, veterans move slowly. Each side is
/// judged on its own games-played count.
pub fn k_for(store: &RatingStore, key: &str, settings: &EloSettings) -> i32 {
    let games = store.games_played(key);
    if games < settings.rookie_games {
        settings.rookie_k
    } else if games > settings.veteran_games {
        settings.veteran_k
    } else {
        settings.base_k
    }
}

/// Shrink K as the implied pairwise outcomes of a single batch vote grow,
/// so one bulk judgment cannot blow ratings up.
pub fn k_batch_scale(total_batch_size: usize, settings: &EloSettings) -> f64 {
    if total_batch_size <= 1 {
        return settings.base_k as f64;
    }
    let scaled = settings.base_k as f64 / ((total_batch_size - 1) as f64).sqrt();
    scaled.max(settings.pair_k_floor as f64)
}

/// Apply a single win/loss outcome.
///
/// A key missing from the store means the UI raced a data reload; the
/// resolution is skipped, not failed.
pub fn resolve_match(
    store: &mut RatingStore,
    winner: &str,
    loser: &str,
    mode: MatchMode,
    k_override: Option<i32>,
    settings: &EloSettings,
) -> ResolveOutcome {
    let (Some(winner_rating), Some(loser_rating)) =
        (store.rating_of(winner), store.rating_of(loser))
    else {
        return ResolveOutcome::Skipped(SkipReason::StaleKey);
    };

    let expected_winner = expected_score(winner_rating, loser_rating);
    let expected_loser = 1.0 - expected_winner;

    let k_winner = k_override.unwrap_or_else(|| k_for(store, winner, settings));
    let k_loser = k_override.unwrap_or_else(|| k_for(store, loser, settings));

    let new_winner =
        (winner_rating as f64 + k_winner as f64 * (1.0 - expected_winner)).round() as i32;
    let new_loser =
        (loser_rating as f64 + k_loser as f64 * (0.0 - expected_loser)).round() as i32;

    store.set_rating(winner, new_winner);
    store.set_rating(loser, new_loser);
    store.record_win(winner);
    store.record_loss(loser);
    store.record_recent_pair(winner, loser);
    store.push_history(MatchEntry {
        timestamp: Utc::now(),
        winner: winner.to_string(),
        loser: loser.to_string(),
        winner_before: Some(winner_rating),
        loser_before: Some(loser_rating),
        delta_winner: new_winner - winner_rating,
        delta_loser: new_loser - loser_rating,
        p_winner: expected_winner,
        mode,
    });

    ResolveOutcome::Applied
}

/// Apply a one-vs-many batch: every winner beats every loser, each implied
/// pair resolved with a batch-scaled K.
pub fn resolve_batch(
    store: &mut RatingStore,
    winners: &[MovieKey],
    losers: &[MovieKey],
    settings: &EloSettings,
) -> ResolveOutcome {
    if winners.is_empty() {
        return ResolveOutcome::Skipped(SkipReason::EmptyWinners);
    }

    let total = winners.len() + losers.len();
    let k_scaled = k_batch_scale(total, settings);

    for winner in winners {
        for loser in losers {
            if winner == loser {
                continue;
            }
            let k_winner = k_for(store, winner, settings);
            let k_loser = k_for(store, loser, settings);
            let k_pair = (((k_winner + k_loser) as f64 / 2.0)
                * (k_scaled / settings.base_k as f64))
                .round() as i32;
            let k_pair = k_pair.max(settings.pair_k_floor);
            resolve_match(store, winner, loser, MatchMode::Quick, Some(k_pair), settings);
        }
    }

    ResolveOutcome::Applied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EloSettings {
        EloSettings::default()
    }

    fn store_with(pairs: &[(&str, f64)]) -> RatingStore {
        let mut store = RatingStore::new();
        for (key, rating) in pairs {
            store.seed(key, *rating);
        }
        store
    }

    #[test]
    fn even_match_between_fresh_items_moves_sixteen_points() {
        // A 1000 vs B 1000, both at K=32: expected 0.5, so +-16
        let mut store = store_with(&[("A_2000", 5.0), ("B_2000", 5.0)]);
        let outcome = resolve_match(
            &mut store,
            "A_2000",
            "B_2000",
            MatchMode::Regular,
            None,
            &settings(),
        );

        assert!(outcome.is_applied());
        assert_eq!(store.get("A_2000"), 1016);
        assert_eq!(store.get("B_2000"), 984);

        let entry = &store.history()[0];
        assert_eq!(entry.winner_before, Some(1000));
        assert_eq!(entry.loser_before, Some(1000));
        assert_eq!(entry.delta_winner, 16);
        assert_eq!(entry.delta_loser, -16);
        assert!((entry.p_winner - 0.5).abs() < 1e-12);
    }

    #[test]
    fn favorite_gains_less_than_underdog_would() {
        // A 1100 (seed 7) vs B 950 (seed 4): the expected winner gains less
        // than the upset winner would.
        let mut favored = store_with(&[("A_2000", 7.0), ("B_2000", 4.0)]);
        resolve_match(&mut favored, "A_2000", "B_2000", MatchMode::Regular, None, &settings());
        let favorite_gain = favored.get("A_2000") - 1100;

        let mut upset = store_with(&[("A_2000", 7.0), ("B_2000", 4.0)]);
        resolve_match(&mut upset, "B_2000", "A_2000", MatchMode::Regular, None, &settings());
        let underdog_gain = upset.get("B_2000") - 950;

        assert!(favorite_gain < underdog_gain);
    }

    #[test]
    fn equal_k_override_makes_transfer_symmetric() {
        let mut store = store_with(&[("A_2000", 7.0), ("B_2000", 4.0)]);
        resolve_match(&mut store, "A_2000", "B_2000", MatchMode::Regular, Some(24), &settings());

        let entry = &store.history()[0];
        assert_eq!(entry.delta_winner, -entry.delta_loser);
    }

    #[test]
    fn games_played_increments_once_per_side() {
        let mut store = store_with(&[("A_2000", 5.0), ("B_2000", 5.0)]);
        assert_eq!(store.games_played("A_2000"), 0);

        resolve_match(&mut store, "A_2000", "B_2000", MatchMode::Regular, None, &settings());
        assert_eq!(store.games_played("A_2000"), 1);
        assert_eq!(store.games_played("B_2000"), 1);

        resolve_match(&mut store, "B_2000", "A_2000", MatchMode::Regular, None, &settings());
        assert_eq!(store.games_played("A_2000"), 2);
        assert_eq!(store.games_played("B_2000"), 2);
    }

    #[test]
    fn stale_key_resolution_is_a_named_skip() {
        let mut store = store_with(&[("A_2000", 5.0)]);
        let outcome = resolve_match(
            &mut store,
            "A_2000",
            "Ghost_1990",
            MatchMode::Regular,
            None,
            &settings(),
        );

        assert_eq!(outcome, ResolveOutcome::Skipped(SkipReason::StaleKey));
        assert_eq!(store.get("A_2000"), 1000);
        assert!(store.history().is_empty());
        assert_eq!(store.games_played("A_2000"), 0);
    }

    #[test]
    fn k_factor_follows_games_played() {
        let mut store = store_with(&[("A_2000", 5.0)]);
        let s = settings();
        assert_eq!(k_for(&store, "A_2000", &s), 32);

        store.set_counters("A_2000", 6, 4);
        assert_eq!(k_for(&store, "A_2000", &s), 24);

        store.set_counters("A_2000", 40, 11);
        assert_eq!(k_for(&store, "A_2000", &s), 16);
    }

    #[test]
    fn batch_of_three_scales_pair_k_to_twenty_three() {
        // winners=[X], losers=[Y,Z], all fresh (K=32):
        // scale = max(10, 24/sqrt(2)) ~= 16.97, pair K = round(32*16.97/24) = 23
        let mut store = store_with(&[("X_2000", 5.0), ("Y_2000", 5.0), ("Z_2000", 5.0)]);
        let outcome = resolve_batch(
            &mut store,
            &["X_2000".to_string()],
            &["Y_2000".to_string(), "Z_2000".to_string()],
            &settings(),
        );

        assert!(outcome.is_applied());
        let history = store.history();
        assert_eq!(history.len(), 2);
        // First pair at 1000 vs 1000: delta = round(23 * 0.5) = 12
        assert_eq!(history[0].delta_winner, 12);
        assert_eq!(history[0].mode, MatchMode::Quick);
    }

    #[test]
    fn batch_without_winners_is_skipped() {
        let mut store = store_with(&[("X_2000", 5.0), ("Y_2000", 5.0)]);
        let outcome = resolve_batch(&mut store, &[], &["Y_2000".to_string()], &settings());
        assert_eq!(outcome, ResolveOutcome::Skipped(SkipReason::EmptyWinners));
        assert!(store.history().is_empty());
    }

    #[test]
    fn batch_scale_floor_holds_for_large_batches() {
        let s = settings();
        assert_eq!(k_batch_scale(1, &s), 24.0);
        assert!((k_batch_scale(3, &s) - 24.0 / 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(k_batch_scale(100, &s), 10.0);
    }
}
