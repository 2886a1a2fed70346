use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardItem {
    pub rank: usize,
    pub key: String,
    pub title: String,
    pub rating: i32,
    pub rank_delta: i32,
    pub wins: u32,
    pub losses: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub items: Vec<LeaderboardItem>,
    pub total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairSide {
    pub key: String,
    pub title: String,
    pub rating: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairResponse {
    pub left: PairSide,
    pub right: PairSide,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub winner: String,
    pub loser: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub winners: Vec<String>,
    pub losers: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub applied: bool,
    /// Set when the resolution was a deliberate no-op, e.g. "staleKey"
    pub skipped: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsetItem {
    pub winner: String,
    pub loser: String,
    pub p_winner: f64,
    pub delta: i32,
    pub date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwingItem {
    pub movie: String,
    pub opponent: String,
    pub delta: i32,
    pub p_win: f64,
    pub date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakItem {
    pub movie: String,
    pub streak: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovedItem {
    pub movie: String,
    pub delta: i32,
    pub games: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentItem {
    pub date: String,
    pub winner: String,
    pub loser: String,
    pub p_winner: f64,
    pub delta_winner: i32,
    pub delta_loser: i32,
    pub mode: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub upsets: Vec<UpsetItem>,
    pub gains: Vec<SwingItem>,
    pub losses: Vec<SwingItem>,
    pub win_streaks: Vec<StreakItem>,
    pub loss_streaks: Vec<StreakItem>,
    pub most_improved: Vec<ImprovedItem>,
    pub recent: Vec<RecentItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterParams {
    pub title: String,
    pub year: Option<i32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterResponse {
    pub poster_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStartRequest {
    pub title: String,
    pub year: Option<i32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementOpponent {
    pub key: String,
    pub title: String,
    pub rating: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStatus {
    pub title: String,
    pub working_rating: i32,
    pub cursor: usize,
    pub total: usize,
    pub finished: bool,
    pub opponent: Option<PlacementOpponent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementVoteRequest {
    pub candidate_won: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSummaryResponse {
    pub working_rating: i32,
    pub projected_rank: usize,
    pub projected_stars: f64,
    pub wins: u32,
    pub losses: u32,
}
