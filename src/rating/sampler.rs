use rand::Rng;
use std::collections::HashSet;

use super::store::RatingStore;
use super::types::MovieKey;
use crate::config::settings::EloSettings;

/// Minimum roulette weight so long-played items never vanish entirely
const WEIGHT_FLOOR: f64 = 0.001;

/// Draw one key by inverse-games-played roulette. Items in `exclude` are
/// ineligible. Under-played items get proportionally more exposure, which
/// pushes coverage toward uniform over time.
pub fn weighted_pick<'a>(
    pool: &'a [MovieKey],
    store: &RatingStore,
    exclude: &HashSet<MovieKey>,
    rng: &mut impl Rng,
) -> Option<&'a MovieKey> {
    let items: Vec<&MovieKey> = pool.iter().filter(|k| !exclude.contains(*k)).collect();
    if items.is_empty() {
        return None;
    }

    let weights: Vec<f64> = items
        .iter()
        .map(|k| {
            let w = 1.0 / (1.0 + store.games_played(k) as f64);
            w.max(WEIGHT_FLOOR)
        })
        .collect();
    let sum: f64 = weights.iter().sum();

    let mut r = rng.random::<f64>() * sum;
    for (item, weight) in items.iter().zip(&weights) {
        r -= weight;
        if r <= 0.0 {
            return Some(item);
        }
    }
    items.last().copied()
}

/// Pick a well-matched, under-compared pair.
///
/// The first item is a plain weighted pick. For its opponent we collect a
/// weighted sample (skipping anything recently paired with the first item,
/// with a bounded retry budget on small pools) and take the closest rating
/// in it, so matches stay near 50/50 while exploration still happens.
pub fn pick_pair(
    pool: &[MovieKey],
    store: &RatingStore,
    settings: &EloSettings,
    rng: &mut impl Rng,
) -> Option<(MovieKey, MovieKey)> {
    if pool.len() < 2 {
        return None;
    }

    let first = weighted_pick(pool, store, &HashSet::new(), rng)?.clone();
    let first_rating = store.get(&first);

    let sample_count = settings.sample_size.min(pool.len() - 1);
    let mut exclude: HashSet<MovieKey> = HashSet::from([first.clone()]);
    let mut sample: Vec<MovieKey> = Vec::new();
    let mut guard = 0;
    while sample.len() < sample_count && guard < settings.sample_guard {
        guard += 1;
        let Some(pick) = weighted_pick(pool, store, &exclude, rng) else {
            break;
        };
        let pick = pick.clone();
        if !store.was_recently_paired(&first, &pick) {
            sample.push(pick.clone());
        }
        exclude.insert(pick);
    }

    // Small pools can exhaust the sample entirely; fall back to everything
    let fallback: Vec<MovieKey>;
    let candidates: &[MovieKey] = if sample.is_empty() {
        fallback = pool.iter().filter(|k| **k != first).cloned().collect();
        &fallback
    } else {
        &sample
    };

    let mut best: Option<&MovieKey> = None;
    let mut best_diff = i32::MAX;
    for cand in candidates {
        let diff = (store.get(cand) - first_rating).abs();
        if diff < best_diff {
            best = Some(cand);
            best_diff = diff;
        }
    }

    best.map(|b| (first, b.clone()))
}

/// Deal a quick-mode batch: repeated weighted picks without replacement.
pub fn deal_batch(
    pool: &[MovieKey],
    store: &RatingStore,
    size: usize,
    rng: &mut impl Rng,
) -> Vec<MovieKey> {
    let target = size.min(pool.len());
    let mut used: HashSet<MovieKey> = HashSet::new();
    let mut batch = Vec::with_capacity(target);
    while batch.len() < target {
        let Some(pick) = weighted_pick(pool, store, &used, rng) else {
            break;
        };
        let pick = pick.clone();
        batch.push(pick.clone());
        used.insert(pick);
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool_of(n: usize) -> (Vec<MovieKey>, RatingStore) {
        let mut store = RatingStore::new();
        let pool: Vec<MovieKey> = (0..n).map(|i| format!("M{}_2000", i)).collect();
        for (i, key) in pool.iter().enumerate() {
            store.seed(key, (i % 11) as f64);
        }
        (pool, store)
    }

    #[test]
    fn weighted_pick_never_returns_excluded_keys() {
        let (pool, store) = pool_of(10);
        let exclude: HashSet<MovieKey> =
            HashSet::from(["M0_2000".to_string(), "M1_2000".to_string()]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let pick = weighted_pick(&pool, &store, &exclude, &mut rng).unwrap();
            assert!(!exclude.contains(pick));
        }
    }

    #[test]
    fn weighted_pick_on_fully_excluded_pool_is_none() {
        let (pool, store) = pool_of(3);
        let exclude: HashSet<MovieKey> = pool.iter().cloned().collect();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(weighted_pick(&pool, &store, &exclude, &mut rng).is_none());
    }

    #[test]
    fn pick_pair_needs_two_items() {
        let (pool, store) = pool_of(1);
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pick_pair(&pool, &store, &EloSettings::default(), &mut rng).is_none());
    }

    #[test]
    fn pick_pair_returns_distinct_keys() {
        let (pool, store) = pool_of(30);
        let settings = EloSettings::default();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let (a, b) = pick_pair(&pool, &store, &settings, &mut rng).unwrap();
            assert_ne!(a, b);
        }
    }

    #[test]
    fn pick_pair_on_two_items_survives_recent_rematch() {
        let (pool, mut store) = pool_of(2);
        store.record_recent_pair(&pool[0], &pool[1]);
        let mut rng = StdRng::seed_from_u64(3);

        // Sample collection finds nothing fresh; the full-pool fallback
        // still produces the only possible pair.
        let (a, b) = pick_pair(&pool, &store, &EloSettings::default(), &mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn deal_batch_is_duplicate_free_and_capped() {
        let (pool, store) = pool_of(5);
        let mut rng = StdRng::seed_from_u64(11);

        let batch = deal_batch(&pool, &store, 14, &mut rng);
        assert_eq!(batch.len(), 5);
        let unique: HashSet<&MovieKey> = batch.iter().collect();
        assert_eq!(unique.len(), 5);
    }
}
