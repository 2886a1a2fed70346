use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::api::models::{
    ImprovedItem, LeaderboardItem, LeaderboardResponse, PairResponse, PairSide, RecentItem,
    StatsResponse, StreakItem, SwingItem, UpsetItem,
};
use crate::rating::{analytics, sampler};
use super::AppState;

const TABLE_LIMIT: usize = 10;
const RECENT_LIMIT: usize = 25;
const IMPROVED_WINDOW: usize = 50;

pub async fn get_leaderboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };

    let titles = engine.titles.clone();
    let rows = engine.store.leaderboard(&titles);
    // ensure_baseline may have repaired the snapshot
    if let Err(e) = engine.persist() {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("Persist error: {}", e)).into_response();
    }

    let items: Vec<LeaderboardItem> = rows
        .into_iter()
        .map(|row| LeaderboardItem {
            rank: row.rank,
            key: row.key,
            title: row.title,
            rating: row.rating,
            rank_delta: row.rank_delta,
            wins: row.wins,
            losses: row.losses,
        })
        .collect();
    let total = items.len();

    Json(LeaderboardResponse { items, total }).into_response()
}

pub async fn get_pair(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };

    if engine.pool.len() < 2 {
        return (
            StatusCode::BAD_REQUEST,
            "Need at least 2 rated movies to play",
        )
            .into_response();
    }

    let mut rng = rand::rng();
    let Some((left, right)) =
        sampler::pick_pair(&engine.pool, &engine.store, &engine.config.elo, &mut rng)
    else {
        return (StatusCode::BAD_REQUEST, "No pair available").into_response();
    };

    let side = |key: &String| PairSide {
        title: engine.titles.display_name(key),
        rating: engine.store.get(key),
        key: key.clone(),
    };
    Json(PairResponse {
        left: side(&left),
        right: side(&right),
    })
    .into_response()
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };

    let history = engine.store.history();
    let titles = &engine.titles;
    let date = |t: &chrono::DateTime<chrono::Utc>| t.format("%Y-%m-%d").to_string();

    let upsets = analytics::biggest_upsets(history, TABLE_LIMIT)
        .into_iter()
        .map(|row| UpsetItem {
            winner: titles.display_name(&row.winner),
            loser: titles.display_name(&row.loser),
            p_winner: row.p_winner,
            delta: row.delta,
            date: date(&row.timestamp),
        })
        .collect();

    let swing = |row: analytics::SwingRow| SwingItem {
        movie: titles.display_name(&row.key),
        opponent: titles.display_name(&row.opponent),
        delta: row.delta,
        p_win: row.p_win,
        date: date(&row.timestamp),
    };
    let gains = analytics::biggest_gains(history, TABLE_LIMIT)
        .into_iter()
        .map(swing)
        .collect();
    let losses = analytics::biggest_losses(history, TABLE_LIMIT)
        .into_iter()
        .map(swing)
        .collect();

    let (win_rows, loss_rows) = analytics::compute_streaks(history, TABLE_LIMIT);
    let streak = |row: analytics::StreakRow| StreakItem {
        movie: titles.display_name(&row.key),
        streak: row.streak,
    };
    let win_streaks = win_rows.into_iter().map(streak).collect();
    let loss_streaks = loss_rows.into_iter().map(streak).collect();

    let most_improved = analytics::most_improved(history, IMPROVED_WINDOW, TABLE_LIMIT)
        .into_iter()
        .map(|row| ImprovedItem {
            movie: titles.display_name(&row.key),
            delta: row.delta_sum,
            games: row.games,
        })
        .collect();

    let recent = analytics::recent_matches(history, RECENT_LIMIT)
        .into_iter()
        .map(|entry| RecentItem {
            date: entry.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            winner: titles.display_name(&entry.winner),
            loser: titles.display_name(&entry.loser),
            p_winner: entry.p_winner,
            delta_winner: entry.delta_winner,
            delta_loser: entry.delta_loser,
            mode: entry.mode.as_str().to_string(),
        })
        .collect();

    Json(StatsResponse {
        upsets,
        gains,
        losses,
        win_streaks,
        loss_streaks,
        most_improved,
        recent,
    })
    .into_response()
}
