//! Password hashing backed by Argon2.
//!
//! Hashes are emitted as PHC strings, so the parameters used to create a
//! hash travel with it and verification keeps working after the configured
//! parameters change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use common::{AppError, AppResult, HashingConfig};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Password hashing service.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait Hasher: Send + Sync {
    /// Hash `plain_text` with a fresh random salt.
    fn hash(&self, plain_text: &str) -> AppResult<String>;

    /// Check `plain_text` against a PHC hash string.
    ///
    /// Returns `Ok(false)` on mismatch; a malformed hash is an error.
    fn verify(&self, plain_text: &str, hash: &str) -> AppResult<bool>;
}

/// Argon2id hasher.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("memory_kib", &self.params.m_cost())
            .field("iterations", &self.params.t_cost())
            .field("parallelism", &self.params.p_cost())
            .finish()
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    /// Build a hasher from configured cost parameters.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if Argon2 rejects the parameters.
    pub fn from_config(config: &HashingConfig) -> AppResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AppError::invalid_argument(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    #[inline]
    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Hasher for Argon2Hasher {
    fn hash(&self, plain_text: &str) -> AppResult<String> {
        if plain_text.is_empty() {
            return Err(AppError::invalid_argument("password must not be empty"));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Password hash failed: {}", e);
                AppError::cryptography("Password hash failed", e)
            })?;
        Ok(hash.to_string())
    }

    fn verify(&self, plain_text: &str, hash: &str) -> AppResult<bool> {
        if hash.is_empty() {
            return Err(AppError::invalid_argument("hash must not be empty"));
        }

        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::cryptography("Invalid hash format", e))?;

        match self.argon2().verify_password(plain_text.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                tracing::error!("Password verification failed: {}", e);
                Err(AppError::cryptography("Password verification failed", e))
            }
        }
    }
}
