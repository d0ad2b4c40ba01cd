use crate::IdentityError;
use bcrypt::{hash, verify, DEFAULT_COST};

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hashes a password with bcrypt on the blocking pool so the async
/// runtime is not stalled by the cost factor.
pub async fn hash_password(password: &str, cost: Option<u32>) -> Result<String, IdentityError> {
    let password = password.to_string();
    let cost = cost.unwrap_or(DEFAULT_COST);
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| IdentityError::Provider(anyhow::anyhow!("join error: {e}")))?
        .map_err(|e| IdentityError::Provider(anyhow::Error::from(e)))
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, IdentityError> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| IdentityError::Provider(anyhow::anyhow!("join error: {e}")))?
        .map_err(|e| IdentityError::Provider(anyhow::Error::from(e)))
}
