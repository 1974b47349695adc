use std::fmt;

use argon2::{
    password_hash::{self, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{ModelError, ModelResult};

/// Argon2 PHC string. The salt lives inside the encoded value.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash loaded from storage.
    pub(crate) fn from_stored(encoded: String) -> Self {
        Self(encoded)
    }

    pub(crate) fn as_stored(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

pub fn hash_password(plain: &str) -> ModelResult<PasswordHash> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            ModelError::Hashing(e.to_string())
        })?
        .to_string();
    Ok(PasswordHash(hash))
}

pub fn verify_password(plain: &str, hash: &PasswordHash) -> ModelResult<bool> {
    let parsed = password_hash::PasswordHash::new(&hash.0).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        ModelError::Hashing(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
