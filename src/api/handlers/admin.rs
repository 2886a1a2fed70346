use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::services::export;
use super::AppState;

pub async fn post_reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };

    match engine.reset() {
        Ok(()) => {
            log::info!("Engine reset; {} movies re-seeded", engine.store.len());
            (StatusCode::OK, "Reset complete").into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Reset failed: {}", e))
            .into_response(),
    }
}

pub async fn get_history_csv(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = match state.engine.lock() {
        Ok(engine) => engine,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "State lock poisoned").into_response(),
    };

    if engine.store.history().is_empty() {
        return (StatusCode::NOT_FOUND, "No matches recorded yet").into_response();
    }

    match export::history_csv(engine.store.history(), &engine.titles) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"elo_match_log.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Export failed: {}", e))
            .into_response(),
    }
}
