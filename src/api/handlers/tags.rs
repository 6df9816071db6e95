use axum::{extract::State, Json};

use crate::{
    api::{ApiJson, AppState},
    auth::AuthUser,
    error::AppResult,
    models::TagSurvey,
    recommender::{resolve_query, QueryPayload},
};

/// Stores the caller's tag survey, normalized like a recommendation query
pub async fn save_tags(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(mut payload): ApiJson<QueryPayload>,
) -> AppResult<Json<TagSurvey>> {
    // a survey has no free text
    payload.description = None;
    let survey = TagSurvey::from(resolve_query(&payload)?);

    state.users.save_tag_survey(user.user_id, &survey).await?;
    tracing::info!(user_id = %user.user_id, "Tag survey saved");
    Ok(Json(survey))
}

/// Returns the saved survey, or an empty one
pub async fn get_tags(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<TagSurvey>> {
    let survey = state.users.tag_survey(user.user_id).await?.unwrap_or_default();
    Ok(Json(survey))
}
