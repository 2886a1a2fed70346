use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::api::models::{PosterParams, PosterResponse};
use super::AppState;

/// Poster lookup for the dashboard. Purely cosmetic: runs without touching
/// the engine lock, and every failure (no key, no hit, network error) is
/// just an empty answer.
pub async fn get_poster(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PosterParams>,
) -> impl IntoResponse {
    let Some(client) = &state.tmdb else {
        return Json(PosterResponse { poster_url: None }).into_response();
    };

    let path = client.fetch_poster(&params.title, params.year).await;
    Json(PosterResponse {
        poster_url: path.map(|p| client.image_url(&p, "w342")),
    })
    .into_response()
}
