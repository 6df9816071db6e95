use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub models_loaded: bool,
    pub db_connected: bool,
    pub total_places: usize,
}

/// Liveness banner
pub async fn home() -> &'static str {
    "Travel recommendation API is running"
}

/// Health check endpoint; storage failures are reported, not raised
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let recommender = state.recommender();
    Json(HealthResponse {
        status: "ok",
        models_loaded: recommender.is_loaded(),
        db_connected: state.users.ping().await,
        total_places: recommender.total_places(),
    })
}
