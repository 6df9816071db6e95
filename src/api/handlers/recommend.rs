use axum::{extract::State, Json};
use serde_json::Value;

use crate::{
    api::{ApiJson, AppState},
    auth::MaybeAuthUser,
    error::AppResult,
    recommender::{QueryPayload, RecommendError},
    services::RecommendationResponse,
};

/// Splits `top_k` off the body and reads the rest as a query payload
fn parse_body(mut body: Value) -> Result<(QueryPayload, Option<i64>), RecommendError> {
    let object = body
        .as_object_mut()
        .ok_or_else(|| RecommendError::InvalidQuery("request body must be an object".to_string()))?;

    let top_k = match object.remove("top_k") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(raw.as_i64().ok_or_else(|| {
            RecommendError::InvalidQuery("top_k must be an integer".to_string())
        })?),
    };

    let payload = serde_json::from_value(body)
        .map_err(|e| RecommendError::InvalidQuery(format!("malformed query: {e}")))?;
    Ok((payload, top_k))
}

/// Hybrid recommendations; signed-in callers may send an empty body to use
/// their saved tag survey
pub async fn recommend(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<RecommendationResponse>> {
    let (payload, top_k) = parse_body(body)?;
    let response = state
        .recommendations
        .recommend(&payload, top_k, user.map(|u| u.user_id))
        .await?;
    Ok(Json(response))
}
