//! Password hashing with Argon2id.
//!
//! Hashes are stored in PHC string format, so the parameters travel with the
//! hash and can be upgraded without invalidating existing accounts.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash is not a valid PHC string")]
    MalformedHash,

    #[error("failed to verify password: {0}")]
    Verify(String),
}

/// Hashes a plaintext password, returning a PHC-formatted Argon2id string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verifies a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` for a wrong password; `Err` only for malformed input
/// or an internal verifier failure.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| PasswordError::MalformedHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Verify(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_produces_phc_argon2id_string() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("reservia").unwrap();
        let b = hash_password("reservia").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_accepts_matching_password() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(verify_password("s3cret!", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(!verify_password("not-it", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        let result = verify_password("anything", "plainly-not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::MalformedHash)));
    }

    #[test]
    fn unicode_passwords_round_trip() {
        let password = "pässwörd-密码";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash).unwrap());
    }
}
