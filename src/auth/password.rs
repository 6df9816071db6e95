use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Hashes a password with Argon2id and a fresh random salt.
///
/// The result is a PHC string carrying algorithm, parameters and salt.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| AppError::Internal(format!("Failed to encode salt: {e}")))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC hash
pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Internal(format!("Stored password hash is malformed: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash checked when a login names no account, so that path costs the same
/// Argon2 verification as a wrong password
pub(crate) static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Verifies `password` against the dummy hash; always `false`
pub fn verify_dummy_password(password: &str) -> AppResult<bool> {
    let hash = match DUMMY_HASH.get() {
        Some(hash) => hash,
        None => {
            let hash = hash_password(&Uuid::new_v4().to_string())?;
            DUMMY_HASH.get_or_init(|| hash)
        }
    };
    verify_password(password, hash)?;
    Ok(false)
}
