use std::sync::Arc;

use crate::{
    auth::{hash_password, verify_dummy_password, verify_password, AuthConfig},
    db::UserRepository,
    error::{AppError, AppResult},
    models::{NewUser, User},
};

/// Sign-up and sign-in on top of the user store
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    auth: AuthConfig,
}

/// Returns the trimmed value, or an error naming the missing field
fn required<'a>(field: &str, value: Option<&'a str>) -> AppResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{field} is required")))
}

/// Runs an Argon2 call on the blocking pool
async fn argon2<T, F>(work: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("password task failed: {e}")))?
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, auth: AuthConfig) -> Self {
        Self { users, auth }
    }

    /// Creates an account with an Argon2 password hash
    pub async fn signup(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
        name: Option<&str>,
    ) -> AppResult<User> {
        let username = required("username", username)?;
        let email = required("email", email)?;
        // passwords are taken as typed
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::InvalidInput("password is required".to_string()))?;

        let password = password.to_string();
        let password_hash = argon2(move || hash_password(&password)).await?;

        let user = self
            .users
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                name: name.map(str::trim).filter(|n| !n.is_empty()).map(String::from),
            })
            .await?;

        tracing::info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Checks credentials and issues an access token
    pub async fn login(&self, username: Option<&str>, password: Option<&str>) -> AppResult<String> {
        let username = required("username", username)?;
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::InvalidInput("password is required".to_string()))?;

        let invalid = || AppError::Unauthorized("invalid username or password".to_string());

        let password = password.to_string();
        let Some(user) = self.users.find_user_by_username(username).await? else {
            // same Argon2 cost as a wrong password
            argon2(move || verify_dummy_password(&password)).await?;
            return Err(invalid());
        };

        let stored = user.password_hash.clone();
        if !argon2(move || verify_password(&password, &stored)).await? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(invalid());
        }

        self.auth.issue_token(user.id)
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
}
