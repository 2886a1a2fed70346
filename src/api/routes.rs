use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers::{
    admin::{get_history_csv, post_reset},
    leaderboard::{get_leaderboard, get_pair, get_stats},
    matches::{post_batch, post_match},
    placement::{
        cancel_placement, placement_summary, save_placement, start_placement, vote_placement,
    },
    posters::get_poster,
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/stats", get(get_stats))
        .route("/api/pair", get(get_pair))
        .route("/api/match", post(post_match))
        .route("/api/batch", post(post_batch))
        .route("/api/placement/start", post(start_placement))
        .route("/api/placement/vote", post(vote_placement))
        .route("/api/placement/summary", get(placement_summary))
        .route("/api/placement/save", post(save_placement))
        .route("/api/placement/cancel", post(cancel_placement))
        .route("/api/poster", get(get_poster))
        .route("/api/history.csv", get(get_history_csv))
        .route("/api/reset", post(post_reset))
        .with_state(state)
}
