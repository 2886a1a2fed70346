use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::api::models::{BatchRequest, MatchRequest, ResolveResponse};
use crate::rating::resolver;
use crate::rating::types::{MatchMode, ResolveOutcome, SkipReason};
use super::AppState;

fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::StaleKey => "staleKey",
        SkipReason::EmptyWinners => "emptyWinners",
    }
}

pub async fn post_match(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MatchRequest>,
) -> impl IntoResponse {
    let mut engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };

    let settings = engine.config.elo.clone();
    let outcome = resolver::resolve_match(
        &mut engine.store,
        &request.winner,
        &request.loser,
        MatchMode::Regular,
        None,
        &settings,
    );

    if outcome.is_applied() {
        if let Err(e) = engine.persist() {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Persist error: {}", e))
                .into_response();
        }
    }

    let skipped = match outcome {
        ResolveOutcome::Applied => None,
        ResolveOutcome::Skipped(reason) => Some(skip_label(reason).to_string()),
    };
    Json(ResolveResponse {
        applied: outcome.is_applied(),
        skipped,
    })
    .into_response()
}

pub async fn post_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> impl IntoResponse {
    let mut engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };

    if request.winners.len() + request.losers.len() < 3 {
        return (
            StatusCode::BAD_REQUEST,
            "Need at least 3 movies in a quick batch",
        )
            .into_response();
    }

    let settings = engine.config.elo.clone();
    let outcome =
        resolver::resolve_batch(&mut engine.store, &request.winners, &request.losers, &settings);

    if outcome.is_applied() {
        if let Err(e) = engine.persist() {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Persist error: {}", e))
                .into_response();
        }
    }

    let skipped = match outcome {
        ResolveOutcome::Applied => None,
        ResolveOutcome::Skipped(reason) => Some(skip_label(reason).to_string()),
    };
    Json(ResolveResponse {
        applied: outcome.is_applied(),
        skipped,
    })
    .into_response()
}
