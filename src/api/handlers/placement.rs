use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::api::models::{
    PlacementOpponent, PlacementStartRequest, PlacementStatus, PlacementSummaryResponse,
    PlacementVoteRequest,
};
use crate::rating::placement::PlacementSession;
use crate::services::state::EngineState;
use super::AppState;

fn status_of(session: &PlacementSession, engine: &EngineState) -> PlacementStatus {
    let (cursor, total) = session.progress();
    let opponent = session.current_opponent().map(|key| PlacementOpponent {
        title: engine.titles.display_name(key),
        rating: engine.store.get(key),
        key: key.clone(),
    });
    PlacementStatus {
        title: session.title.clone(),
        working_rating: session.working_rating(),
        cursor,
        total,
        finished: session.is_finished(),
        opponent,
    }
}

pub async fn start_placement(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlacementStartRequest>,
) -> impl IntoResponse {
    let engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };

    if engine.store.len() < engine.config.placement.min_pool {
        return (
            StatusCode::BAD_REQUEST,
            "Play a few matches first so there are opponents to compare against",
        )
            .into_response();
    }

    let mut rng = rand::rng();
    let session = match PlacementSession::start(
        &request.title,
        request.year,
        &engine.store,
        engine.csv_mean_rating(),
        &engine.config.placement,
        &mut rng,
    ) {
        Ok(session) => session,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let status = status_of(&session, &engine);
    let Ok(mut slot) = state.placement.lock() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Placement lock poisoned").into_response();
    };
    *slot = Some(session);
    Json(status).into_response()
}

pub async fn vote_placement(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlacementVoteRequest>,
) -> impl IntoResponse {
    let engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };
    let Ok(mut slot) = state.placement.lock() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Placement lock poisoned").into_response();
    };
    let Some(session) = slot.as_mut() else {
        return (StatusCode::BAD_REQUEST, "No active placement session").into_response();
    };

    if let Err(e) = session.vote(request.candidate_won, &engine.store, &engine.config.placement) {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    Json(status_of(session, &engine)).into_response()
}

pub async fn placement_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };
    let Ok(slot) = state.placement.lock() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Placement lock poisoned").into_response();
    };
    let Some(session) = slot.as_ref() else {
        return (StatusCode::BAD_REQUEST, "No active placement session").into_response();
    };

    let summary = session.summary(&engine.store, &engine.config.placement);
    Json(PlacementSummaryResponse {
        working_rating: summary.working_rating,
        projected_rank: summary.projected_rank,
        projected_stars: summary.projected_stars,
        wins: summary.wins,
        losses: summary.losses,
    })
    .into_response()
}

pub async fn save_placement(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };
    let Ok(mut slot) = state.placement.lock() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Placement lock poisoned").into_response();
    };
    let Some(session) = slot.take() else {
        return (StatusCode::BAD_REQUEST, "No active placement session").into_response();
    };
    drop(slot);

    let key = session.key().clone();
    let title = session.title.clone();
    let year = session.year;
    session.save(&mut engine.store);
    engine.titles.insert(key, title, year);

    if let Err(e) = engine.persist() {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("Persist error: {}", e))
            .into_response();
    }
    (StatusCode::OK, "Saved").into_response()
}

pub async fn cancel_placement(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Dropping the session discards all of its state; the store was never
    // touched while it ran.
    if let Ok(mut slot) = state.placement.lock() {
        slot.take();
    }
    (StatusCode::OK, "Discarded").into_response()
}
