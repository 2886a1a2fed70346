//! Read-only analytics over the match history. Every function is pure given
//! the history slice; display names are resolved by callers.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::types::{MatchEntry, MovieKey};

#[derive(Debug, Clone)]
pub struct UpsetRow {
    pub winner: MovieKey,
    pub loser: MovieKey,
    pub p_winner: f64,
    pub delta: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SwingRow {
    pub key: MovieKey,
    pub opponent: MovieKey,
    pub delta: i32,
    /// Win probability of `key` in that match
    pub p_win: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StreakRow {
    pub key: MovieKey,
    pub streak: u32,
}

#[derive(Debug, Clone)]
pub struct ImprovedRow {
    pub key: MovieKey,
    pub delta_sum: i32,
    pub games: usize,
}

/// Lowest pre-match winner probability first: the bigger the surprise, the
/// higher the row.
pub fn biggest_upsets(history: &[MatchEntry], limit: usize) -> Vec<UpsetRow> {
    let mut rows: Vec<UpsetRow> = history
        .iter()
        .filter(|m| m.p_winner.is_finite())
        .map(|m| UpsetRow {
            winner: m.winner.clone(),
            loser: m.loser.clone(),
            p_winner: m.p_winner,
            delta: m.delta_winner,
            timestamp: m.timestamp,
        })
        .collect();
    rows.sort_by(|a, b| a.p_winner.total_cmp(&b.p_winner));
    rows.truncate(limit);
    rows
}

pub fn biggest_gains(history: &[MatchEntry], limit: usize) -> Vec<SwingRow> {
    let mut rows: Vec<SwingRow> = history
        .iter()
        .map(|m| SwingRow {
            key: m.winner.clone(),
            opponent: m.loser.clone(),
            delta: m.delta_winner,
            p_win: m.p_winner,
            timestamp: m.timestamp,
        })
        .collect();
    rows.sort_by(|a, b| b.delta.cmp(&a.delta));
    rows.truncate(limit);
    rows
}

pub fn biggest_losses(history: &[MatchEntry], limit: usize) -> Vec<SwingRow> {
    let mut rows: Vec<SwingRow> = history
        .iter()
        .map(|m| SwingRow {
            key: m.loser.clone(),
            opponent: m.winner.clone(),
            delta: m.delta_loser,
            p_win: 1.0 - m.p_winner,
            timestamp: m.timestamp,
        })
        .collect();
    rows.sort_by(|a, b| a.delta.cmp(&b.delta));
    rows.truncate(limit);
    rows
}

#[derive(Debug, Default, Clone, Copy)]
struct StreakState {
    cur_win: u32,
    cur_loss: u32,
    best_win: u32,
    best_loss: u32,
}

/// Best win and loss streaks per key, single chronological pass. A loss
/// resets the win streak immediately and vice versa. Only streaks longer
/// than one game are reported.
pub fn compute_streaks(history: &[MatchEntry], limit: usize) -> (Vec<StreakRow>, Vec<StreakRow>) {
    let mut chronological: Vec<&MatchEntry> = history.iter().collect();
    chronological.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let mut by_key: HashMap<MovieKey, StreakState> = HashMap::new();
    for entry in chronological {
        let w = by_key.entry(entry.winner.clone()).or_default();
        w.cur_win += 1;
        w.best_win = w.best_win.max(w.cur_win);
        w.cur_loss = 0;

        let l = by_key.entry(entry.loser.clone()).or_default();
        l.cur_loss += 1;
        l.best_loss = l.best_loss.max(l.cur_loss);
        l.cur_win = 0;
    }

    let mut wins: Vec<StreakRow> = Vec::new();
    let mut losses: Vec<StreakRow> = Vec::new();
    for (key, state) in by_key {
        if state.best_win > 1 {
            wins.push(StreakRow { key: key.clone(), streak: state.best_win });
        }
        if state.best_loss > 1 {
            losses.push(StreakRow { key, streak: state.best_loss });
        }
    }
    wins.sort_by(|a, b| b.streak.cmp(&a.streak).then_with(|| a.key.cmp(&b.key)));
    losses.sort_by(|a, b| b.streak.cmp(&a.streak).then_with(|| a.key.cmp(&b.key)));
    wins.truncate(limit);
    losses.truncate(limit);
    (wins, losses)
}

/// Sum each key's signed deltas over its most recent `last_n_games` matches,
/// ranked descending. Walks the history newest-first so the window is per
/// key, not global.
pub fn most_improved(history: &[MatchEntry], last_n_games: usize, limit: usize) -> Vec<ImprovedRow> {
    let mut deltas_by_key: HashMap<MovieKey, Vec<i32>> = HashMap::new();
    for entry in history.iter().rev() {
        deltas_by_key
            .entry(entry.winner.clone())
            .or_default()
            .push(entry.delta_winner);
        deltas_by_key
            .entry(entry.loser.clone())
            .or_default()
            .push(entry.delta_loser);
    }

    let mut rows: Vec<ImprovedRow> = deltas_by_key
        .into_iter()
        .map(|(key, deltas)| {
            let window = &deltas[..deltas.len().min(last_n_games)];
            ImprovedRow {
                key,
                delta_sum: window.iter().sum(),
                games: window.len(),
            }
        })
        .filter(|row| row.games > 0)
        .collect();
    rows.sort_by(|a, b| b.delta_sum.cmp(&a.delta_sum).then_with(|| a.key.cmp(&b.key)));
    rows.truncate(limit);
    rows
}

/// Most recent matches, newest first.
pub fn recent_matches(history: &[MatchEntry], limit: usize) -> Vec<&MatchEntry> {
    history.iter().rev().take(limit).collect()
}
