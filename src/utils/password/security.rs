use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use md5::{Digest, Md5};
use std::sync::Arc;
use thiserror::Error;

use crate::types::PasswordConfig;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingError(String),
    #[error("Unsupported password scheme: {0}")]
    UnsupportedScheme(String),
}

/// One-way credential transform used by the user service.
///
/// Endpoint logic only sees this trait, so the stored format can move from
/// the legacy salted digest to Argon2 through configuration alone.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, PasswordError>;

    fn verify(&self, plain: &str, digest: &str) -> Result<bool, PasswordError>;
}

/// Lowercase hex `md5(plain ++ salt)` with one shared salt.
///
/// Matches credentials already stored by the legacy deployment.
pub struct SaltedMd5Hasher {
    salt: String,
}

impl SaltedMd5Hasher {
    pub fn new(salt: impl Into<String>) -> Self {
        Self {
            salt: salt.into(),
        }
    }
}

impl PasswordHasher for SaltedMd5Hasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let mut hasher = Md5::new();
        hasher.update(plain.as_bytes());
        hasher.update(self.salt.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    fn verify(&self, plain: &str, digest: &str) -> Result<bool, PasswordError> {
        Ok(self.hash(plain)?.eq_ignore_ascii_case(digest))
    }
}

/// Argon2id with a random per-password salt, stored as a PHC string
#[derive(Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingError(e.to_string()))
    }

    /// A digest that is not a PHC string (e.g. a legacy MD5 row) never matches
    fn verify(&self, plain: &str, digest: &str) -> Result<bool, PasswordError> {
        let parsed_hash = match PasswordHash::new(digest) {
            Ok(hash) => hash,
            Err(e) => {
                log::warn!("Stored password is not an Argon2 hash: {}", e);
                return Ok(false);
            },
        };

        Ok(Argon2::default().verify_password(plain.as_bytes(), &parsed_hash).is_ok())
    }
}

/// Build the hasher named by `password.scheme`
pub fn hasher_from_config(config: &PasswordConfig) -> Result<Arc<dyn PasswordHasher>, PasswordError> {
    match config.scheme.as_str() {
        "md5" => Ok(Arc::new(SaltedMd5Hasher::new(config.salt.clone()))),
        "argon2" => Ok(Arc::new(Argon2Hasher)),
        other => Err(PasswordError::UnsupportedScheme(other.to_string())),
    }
}
