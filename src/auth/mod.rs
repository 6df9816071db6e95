pub mod jwt;
pub mod password;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;

pub use jwt::{AuthConfig, Claims};
pub use password::{hash_password, verify_dummy_password, verify_password};

/// Caller identity from a valid `Authorization: Bearer` token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Identity when a token is sent, `None` for anonymous requests.
///
/// A token that is present but invalid is still rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let header = parts.headers.get(AUTHORIZATION)?;
    Some(
        header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("expected Bearer token".into())),
    )
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))??;

        let user_id = config.verify_token(token)?;
        Ok(AuthUser { user_id })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeAuthUser(None));
        };

        let config = AuthConfig::from_ref(state);
        let user_id = config.verify_token(token?)?;
        Ok(MaybeAuthUser(Some(AuthUser { user_id })))
    }
}
