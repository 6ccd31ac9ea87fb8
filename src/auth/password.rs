//! # Password hashing and verification: Argon2id
//!
//! - [`PasswordHasher::hash`] draws a 16-byte salt from the OS RNG, hashes the
//!   plaintext with Argon2id and returns a PHC-format string
//!   (`$argon2id$v=19$m=19456,t=2,p=1$...`). Running out of entropy is an
//!   error, not a panic.
//! - [`PasswordHasher::verify`] parses a PHC string and checks the plaintext
//!   against it. The comparison inside `argon2` is constant time. `Ok(false)`
//!   is a mismatch; `Err` means the stored digest is unusable.
//!
//! Argon2 is deliberately slow, so request handlers go through the `_async`
//! variants, which run on tokio's blocking pool.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("failed to gather salt entropy: {0}")]
    Entropy(String),

    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    Malformed(String),

    #[error("password hashing task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Digest of a throwaway password, used to equalize the cost of rejections.
    dummy: Arc<OnceCell<String>>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

impl PasswordHasher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy: Arc::new(OnceCell::new()),
        }
    }

    /// Hash a password. Returns a PHC-format string.
    ///
    /// # Errors
    /// Fails if the OS RNG cannot supply a salt or Argon2 rejects the input.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let mut salt_bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|e| HashError::Entropy(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| HashError::Hash(e.to_string()))?;

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a PHC-format hash string.
    ///
    /// # Errors
    /// Fails only when `hash` is not a parseable PHC string.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| HashError::Malformed(e.to_string()))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// [`hash`](Self::hash) on the blocking pool.
    ///
    /// # Errors
    /// See [`hash`](Self::hash); also fails if the worker panics.
    pub async fn hash_async(&self, password: &str) -> Result<String, HashError> {
        let hasher = self.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    ///
    /// # Errors
    /// See [`verify`](Self::verify); also fails if the worker panics.
    pub async fn verify_async(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        let hasher = self.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await?
    }

    /// Burn one verification against a throwaway digest.
    ///
    /// Called on rejection paths that never reach a real verify so they take
    /// about as long as a wrong password does.
    ///
    /// # Errors
    /// Fails if the throwaway digest cannot be produced.
    pub async fn verify_dummy(&self, password: &str) -> Result<(), HashError> {
        let dummy = self
            .dummy
            .get_or_try_init(|| async {
                let mut seed = [0u8; 32];
                OsRng
                    .try_fill_bytes(&mut seed)
                    .map_err(|e| HashError::Entropy(e.to_string()))?;
                let throwaway = base64_seed(&seed);
                self.hash_async(&throwaway).await
            })
            .await?;
        self.verify_async(password, dummy).await.map(|_| ())
    }
}

fn base64_seed(seed: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(seed)
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswordHasher {
    // Minimum Argon2 cost keeps tests fast; production uses the defaults.
    match Params::new(
        Params::MIN_M_COST,
        Params::MIN_T_COST,
        Params::MIN_P_COST,
        None,
    ) {
        Ok(params) => PasswordHasher::with_params(params),
        Err(_) => PasswordHasher::default(),
    }
}
