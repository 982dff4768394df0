use crate::error::app_error::AppError;
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::LazyLock;

/// A real Argon2 hash generated once, used as a timing decoy so that
/// lookups for unknown usernames or matric numbers cost the same as
/// lookups for existing ones.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-never-matches", &salt)
        .map(|hash| hash.to_string())
        .unwrap_or_default()
});

/// Hashes a password or fingerprint code into a PHC string.
pub(crate) fn hash_secret(secret: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AppError::password_hash("Failed to hash secret", e))?;

    Ok(hash.to_string())
}

/// Returns `Ok(false)` on mismatch; errors only when the stored hash is unreadable.
pub(crate) fn verify_secret(secret: &str, stored_hash: &str) -> Result<bool, AppError> {
    let hash = PasswordHash::new(stored_hash).map_err(|e| AppError::password_hash("Failed to parse stored hash", e))?;
    Ok(Argon2::default().verify_password(secret.as_bytes(), &hash).is_ok())
}

pub(crate) fn dummy_verify(secret: &str) {
    if let Ok(hash) = PasswordHash::new(&DUMMY_HASH) {
        let _ = Argon2::default().verify_password(secret.as_bytes(), &hash);
    }
}
