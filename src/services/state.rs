use anyhow::Result;
use std::collections::HashSet;

use crate::config::settings::AppConfig;
use crate::domain::models::{MovieRow, TitleIndex};
use crate::domain::sources::DataSource;
use crate::rating::store::RatingStore;
use crate::rating::types::MovieKey;
use crate::storage::{keys, StateStore};

/// Everything a driver (CLI arena or HTTP API) needs: config, storage, the
/// rating store, the loaded dataset and its derived pool and title index.
pub struct EngineState {
    pub config: AppConfig,
    pub storage: StateStore,
    pub store: RatingStore,
    pub dataset: Vec<MovieRow>,
    pub source: Option<DataSource>,
    pub pool: Vec<MovieKey>,
    pub titles: TitleIndex,
}

impl EngineState {
    pub fn load(config: AppConfig) -> Result<Self> {
        let storage = StateStore::new(&config.data_dir)?;
        let store = RatingStore::load(&storage)?;
        let dataset: Vec<MovieRow> = storage.load(keys::CSV_DATA)?.unwrap_or_default();
        let source = storage
            .load::<String>(keys::DATA_SOURCE)?
            .and_then(|s| DataSource::from_str(&s));

        let pool = rated_pool(&dataset);
        let titles = TitleIndex::build(&dataset);

        Ok(Self {
            config,
            storage,
            store,
            dataset,
            source,
            pool,
            titles,
        })
    }

    pub fn have_dataset(&self) -> bool {
        !self.dataset.is_empty()
    }

    /// Mean 0-10 source rating of the rated pool, for placement seeding.
    pub fn csv_mean_rating(&self) -> Option<f64> {
        let rated: Vec<f64> = self
            .dataset
            .iter()
            .filter(|row| row.is_rated())
            .filter_map(|row| row.your_rating)
            .collect();
        if rated.is_empty() {
            return None;
        }
        Some(rated.iter().sum::<f64>() / rated.len() as f64)
    }

    /// Re-seed every pool movie that has no rating yet, then make sure a
    /// baseline exists. Called after ingestion and reset.
    pub fn seed_from_dataset(&mut self) {
        for row in self.dataset.iter().filter(|r| r.is_rated()) {
            if let Some(rating) = row.your_rating {
                self.store.seed(&row.key(), rating);
            }
        }
        self.store.ensure_baseline();
    }

    /// Full engine restart: wipe ratings, counters, history, recent pairs
    /// and baseline, then re-seed from the loaded dataset.
    pub fn reset(&mut self) -> Result<()> {
        self.store.reset();
        self.seed_from_dataset();
        self.store.persist(&self.storage)
    }

    pub fn persist(&self) -> Result<()> {
        self.store.persist(&self.storage)
    }
}

/// Distinct keys of rows with a usable personal rating, dataset order.
pub fn rated_pool(dataset: &[MovieRow]) -> Vec<MovieKey> {
    let mut seen: HashSet<MovieKey> = HashSet::new();
    dataset
        .iter()
        .filter(|row| row.is_rated())
        .map(|row| row.key())
        .filter(|key| seen.insert(key.clone()))
        .collect()
}
