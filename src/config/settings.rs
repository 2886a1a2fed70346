#[derive(Debug, Clone)]
pub struct EloSettings {
    pub base_k: i32,
    pub rookie_k: i32,
    pub veteran_k: i32,
    /// Below this many games a side uses `rookie_k`
    pub rookie_games: u32,
    /// Above this many games a side uses `veteran_k`
    pub veteran_games: u32,
    /// Per-pair K never drops below this in batch resolution
    pub pair_k_floor: i32,
    /// Candidate sample size for smart pairing
    pub sample_size: usize,
    /// Retry budget while building the candidate sample
    pub sample_guard: usize,
    /// Quick-mode batch size
    pub quick_batch_size: usize,
}

impl Default for EloSettings {
    fn default() -> Self {
        Self {
            base_k: 24,
            rookie_k: 32,
            veteran_k: 16,
            rookie_games: 10,
            veteran_games: 50,
            pair_k_floor: 10,
            sample_size: 24,
            sample_guard: 200,
            quick_batch_size: 14,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlacementSettings {
    /// Temporary K applied to the session's working rating
    pub session_k: i32,
    /// Opponents drawn from rating bands of the leaderboard
    pub stratified_count: usize,
    /// Opponents drawn uniformly from the remaining pool
    pub random_count: usize,
    /// Minimum distinct rated keys before a session may start
    pub min_pool: usize,
    /// Star projection: normal model centered here
    pub star_mu: f64,
    pub star_sigma: f64,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            session_k: 40,
            stratified_count: 10,
            random_count: 10,
            min_pool: 5,
            star_mu: 2.5,
            star_sigma: 0.8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TmdbSettings {
    pub base_url: &'static str,
    pub image_base_url: &'static str,
    pub timeout_secs: u64,
    /// Read from MOVIE_ELO_TMDB_KEY; lookups are disabled when absent
    pub api_key: Option<String>,
}

impl Default for TmdbSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3",
            image_base_url: "https://image.tmdb.org/t/p",
            timeout_secs: 10,
            api_key: std::env::var("MOVIE_ELO_TMDB_KEY").ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub elo: EloSettings,
    pub placement: PlacementSettings,
    pub tmdb: TmdbSettings,
    pub data_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            elo: EloSettings::default(),
            placement: PlacementSettings::default(),
            tmdb: TmdbSettings::default(),
            data_dir: std::env::var("MOVIE_ELO_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
        }
    }
}
