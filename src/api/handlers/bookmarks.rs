use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    api::{ApiJson, AppState},
    auth::AuthUser,
    error::{AppError, AppResult},
    models::Bookmark,
};

#[derive(Debug, Deserialize)]
pub struct BookmarkRequest {
    pub place_id: Option<i64>,
}

/// Bookmarks a place; bookmarking it again is a no-op
pub async fn add_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<BookmarkRequest>,
) -> AppResult<Json<Bookmark>> {
    let place_id = request
        .place_id
        .ok_or_else(|| AppError::InvalidInput("place_id is required".to_string()))?;

    let bookmark = state.users.add_bookmark(user.user_id, place_id).await?;
    Ok(Json(bookmark))
}

pub async fn list_bookmarks(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Bookmark>>> {
    Ok(Json(state.users.list_bookmarks(user.user_id).await?))
}

pub async fn remove_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    Path(place_id): Path<i64>,
) -> AppResult<StatusCode> {
    if state.users.remove_bookmark(user.user_id, place_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no bookmark for place {place_id}")))
    }
}
