use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{ApiJson, AppState},
    auth::AuthUser,
    error::{AppError, AppResult},
};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MyPageResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub message: String,
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let user = state
        .accounts
        .signup(
            request.username.as_deref(),
            request.email.as_deref(),
            request.password.as_deref(),
            request.name.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created",
            user_id: user.id,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let access_token = state
        .accounts
        .login(request.username.as_deref(), request.password.as_deref())
        .await?;
    Ok(Json(LoginResponse { access_token }))
}

pub async fn mypage(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<MyPageResponse>> {
    let user = state
        .users
        .find_user_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let display = user.name.as_deref().unwrap_or(&user.username);
    Ok(Json(MyPageResponse {
        message: format!("Welcome, {display}!"),
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}
