//! Local password hashing for the Profile Store.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, SaltString};
use argon2::{Argon2, PasswordVerifier};

use idsync_core::{DomainError, DomainResult};

/// Stored in place of a blank or missing password.
pub const FALLBACK_PASSWORD: &str = "changeme";

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> DomainResult<String>;

    fn verify(&self, plain: &str, hash: &str) -> bool;

    /// Hash `plain`, substituting [`FALLBACK_PASSWORD`] when it is absent or blank.
    fn hash_or_fallback(&self, plain: Option<&str>) -> DomainResult<String> {
        match plain {
            Some(p) if !p.trim().is_empty() => self.hash(p),
            _ => self.hash(FALLBACK_PASSWORD),
        }
    }
}

/// Argon2id with a random salt, encoded as a PHC string.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plain: &str) -> DomainResult<String> {
        let salt = SaltString::generate(OsRng);
        password_hash::PasswordHasher::hash_password(&Argon2::default(), plain.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DomainError::storage(format!("password hashing failed: {e}")))
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .and_then(|parsed| Argon2::default().verify_password(plain.as_bytes(), &parsed))
            .is_ok()
    }
}
