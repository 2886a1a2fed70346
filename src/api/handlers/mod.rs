use std::sync::Mutex;

use crate::fetchers::tmdb::TmdbClient;
use crate::rating::placement::PlacementSession;
use crate::services::state::EngineState;

pub mod admin;
pub mod leaderboard;
pub mod matches;
pub mod placement;
pub mod posters;

/// Shared server state. All engine mutations happen synchronously under the
/// lock, matching the single-writer model the engine assumes. The TMDb
/// client sits outside the lock; poster traffic never blocks ratings.
pub struct AppState {
    pub engine: Mutex<EngineState>,
    pub placement: Mutex<Option<PlacementSession>>,
    pub tmdb: Option<TmdbClient>,
}

impl AppState {
    pub fn new(engine: EngineState, tmdb: Option<TmdbClient>) -> Self {
        Self {
            engine: Mutex::new(engine),
            placement: Mutex::new(None),
            tmdb,
        }
    }
}
