//! Salted one-way password hashing.

use crate::CoreAccessError;
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

/// Hashes and verifies passwords.
///
/// Implementations must produce a self-describing hash string (salt and
/// parameters included) so that `verify` needs nothing but the stored value.
pub trait PasswordHasher: Send + Sync {
    /// Hashes `password` with a freshly generated salt.
    fn hash(&self, password: &str) -> Result<String, CoreAccessError>;

    /// Returns `Ok(true)` if `password` matches `hash`, `Ok(false)` if it does not,
    /// or an error if `hash` is not a valid hash string.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, CoreAccessError>;
}

/// Argon2id hasher producing PHC-format strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, CoreAccessError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CoreAccessError::PasswordHash(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, CoreAccessError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| CoreAccessError::PasswordHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
