//! Argon2id password hashing.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use common::errors::{AppError, AppResult};
use tokio::sync::OnceCell;

/// Hash checked when the account does not exist, so both login failures cost
/// one Argon2 verification.
pub(crate) static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// Hashes `password` into a PHC string with a random salt.
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
}

/// Checks `password` against a stored PHC string.
pub async fn verify_password(password: String, hashed: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hashed)
            .map_err(|e| AppError::Internal(format!("stored password hash is invalid: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))?
}

async fn dummy_hash() -> AppResult<String> {
    DUMMY_HASH
        .get_or_try_init(|| hash_password("no-such-account".to_string()))
        .await
        .cloned()
}

/// Computes the dummy hash ahead of the first login.
pub async fn prepare_dummy_hash() -> AppResult<()> {
    dummy_hash().await.map(|_| ())
}

/// Runs a verification that always fails, for logins with an unknown email.
pub async fn verify_dummy(password: String) -> AppResult<()> {
    verify_password(password, dummy_hash().await?).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("correct horse".into()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong horse".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_password_gets_distinct_salts() {
        let a = hash_password("pw123456".into()).await.unwrap();
        let b = hash_password("pw123456".into()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_dummy_verification_runs_argon2() {
        verify_dummy("anything".into()).await.unwrap();
        let hash = DUMMY_HASH.get().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("anything".into(), hash.clone()).await.unwrap());
    }

    #[tokio::test]
    async fn test_garbage_hash_is_error() {
        assert!(verify_password("x".into(), "not-a-phc".into()).await.is_err());
    }
}
