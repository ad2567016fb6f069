//! Argon2 hashing for account secrets. One home for the scheme so signup,
//! admin creation, reset, and password change all agree on it.

use argon2::{password_hash::PasswordHash, Argon2, PasswordHasher, PasswordVerifier};
use rand::RngCore;

use crate::error::ApiError;

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = argon2::password_hash::SaltString::encode_b64(&salt)
        .map_err(|err| ApiError::Internal(format!("password hashing failed: {err}")))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| ApiError::Internal(format!("password hashing failed: {err}")))?
        .to_string();
    Ok(hash)
}

/// True when the password matches the stored PHC string. An unparseable
/// stored hash counts as a mismatch rather than an error, so a corrupt row
/// can never open a login hole.
pub fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("Secret1").unwrap();
        assert!(verify_password(&hash, "Secret1"));
        assert!(!verify_password(&hash, "Secret2"));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "Secret1"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("Secret1").unwrap();
        let b = hash_password("Secret1").unwrap();
        assert_ne!(a, b);
    }
}
