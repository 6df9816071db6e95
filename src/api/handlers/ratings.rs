use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    api::{ApiJson, AppState},
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{Rating, RATING_RANGE},
};

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub place_id: Option<i64>,
    /// Kept loose so non-integer scores get a 400 with a clear message
    #[serde(default)]
    pub score: Value,
}

fn parse_score(raw: &Value) -> AppResult<i16> {
    raw.as_i64()
        .and_then(|s| i16::try_from(s).ok())
        .filter(|s| RATING_RANGE.contains(s))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "score must be an integer from {} to {}",
                RATING_RANGE.start(),
                RATING_RANGE.end()
            ))
        })
}

/// Creates or replaces the caller's rating for a place
pub async fn rate_place(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<RateRequest>,
) -> AppResult<Json<Rating>> {
    let place_id = request
        .place_id
        .ok_or_else(|| AppError::InvalidInput("place_id is required".to_string()))?;
    let score = parse_score(&request.score)?;

    let rating = state.users.upsert_rating(user.user_id, place_id, score).await?;
    tracing::info!(user_id = %user.user_id, place_id, score, "Rating saved");
    Ok(Json(rating))
}

pub async fn list_ratings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Rating>>> {
    Ok(Json(state.users.list_ratings(user.user_id).await?))
}
