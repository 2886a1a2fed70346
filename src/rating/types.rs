use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type MovieKey = String;
pub type RatingValue = i32;

pub const DEFAULT_RATING: RatingValue = 1000;

/// How a match was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Regular,
    Quick,
    Provisional,
}

impl MatchMode {
    pub fn as_str(&self) -> &str {
        match self {
            MatchMode::Regular => "regular",
            MatchMode::Quick => "quick",
            MatchMode::Provisional => "provisional",
        }
    }
}

/// Append-only match log entry. Pre-match ratings are absent for replayed
/// provisional matches, which ran against a transient working rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEntry {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    pub winner: MovieKey,
    pub loser: MovieKey,
    #[serde(rename = "eloWinner_before")]
    pub winner_before: Option<RatingValue>,
    #[serde(rename = "eloLoser_before")]
    pub loser_before: Option<RatingValue>,
    #[serde(rename = "deltaWinner")]
    pub delta_winner: i32,
    #[serde(rename = "deltaLoser")]
    pub delta_loser: i32,
    #[serde(rename = "pWinner")]
    pub p_winner: f64,
    pub mode: MatchMode,
}

/// Why a resolution was skipped instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// One of the keys is not in the rating store (stale UI reference).
    StaleKey,
    /// Batch submitted with no winners.
    EmptyWinners,
}

/// Outcome of a resolve call. A skip is deliberate no-op behavior, not an
/// error: callers ignore it, tests assert on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Applied,
    Skipped(SkipReason),
}

impl ResolveOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ResolveOutcome::Applied)
    }
}

/// One row of the ranked leaderboard.
#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub key: MovieKey,
    pub title: String,
    pub rating: RatingValue,
    pub rank_delta: i32,
    pub wins: u32,
    pub losses: u32,
}
