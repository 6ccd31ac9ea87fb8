//! Session lifecycle: serialize a principal into a token, resolve it back.
//!
//! The raw token is returned once, to be set as a cookie. Stores only ever
//! see `sha256(token)`, so a leaked session table cannot be replayed.

mod memory;
mod postgres;

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

use async_trait::async_trait;
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    store::{CredentialStore, StoreError, UniqueKey},
    user::User,
};

/// Raw token bytes before encoding.
const TOKEN_BYTES: usize = 32;
/// base64url, no padding, of `TOKEN_BYTES`.
const TOKEN_LEN: usize = 43;
const INSERT_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to generate session token: {0}")]
    Entropy(String),

    #[error("failed to generate a unique session token after {INSERT_ATTEMPTS} attempts")]
    Exhausted,
}

/// Opaque session token handed to the client.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Server-side `token hash -> (user id, expiry)` association.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fails with `StoreError::Duplicate(UniqueKey::SessionHash)` when the hash
    /// is already present.
    async fn insert(&self, token_hash: &[u8], user_id: Uuid, ttl: Duration)
        -> Result<(), StoreError>;

    /// Returns the user id of an unexpired session.
    async fn lookup(&self, token_hash: &[u8]) -> Result<Option<Uuid>, StoreError>;

    /// Idempotent.
    async fn delete(&self, token_hash: &[u8]) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn CredentialStore>,
    ttl: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn CredentialStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            sessions,
            users,
            ttl,
        }
    }

    /// Issue a token for `user` and persist its hash.
    ///
    /// # Errors
    /// Entropy failure, a store fault, or three hash collisions in a row.
    pub async fn establish(&self, user: &User) -> Result<SessionToken, SessionError> {
        for _ in 0..INSERT_ATTEMPTS {
            let token = generate_token()?;
            let token_hash = hash_token(&token);
            match self.sessions.insert(&token_hash, user.id, self.ttl).await {
                Ok(()) => {
                    debug!("session established for user {}", user.id);
                    return Ok(SessionToken(token));
                }
                Err(err) if err.is_duplicate(UniqueKey::SessionHash) => {
                    warn!("session token collision, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(SessionError::Exhausted)
    }

    /// Resolve a presented token to the current principal.
    ///
    /// # Errors
    /// Only backend faults; every kind of bad token is `Anonymous`.
    pub async fn resolve(&self, token: Option<&str>) -> Result<SessionState, SessionError> {
        let Some(token) = token.filter(|token| well_formed(token)) else {
            return Ok(SessionState::Anonymous);
        };

        let Some(user_id) = self.sessions.lookup(&hash_token(token)).await? else {
            return Ok(SessionState::Anonymous);
        };

        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(SessionState::Authenticated(user)),
            None => {
                debug!("session points at missing user {user_id}");
                Ok(SessionState::Anonymous)
            }
        }
    }

    /// Delete the association for `token`. Unknown tokens are not an error.
    ///
    /// # Errors
    /// Store faults.
    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        if !well_formed(token) {
            return Ok(());
        }
        self.sessions.delete(&hash_token(token)).await?;
        Ok(())
    }
}

fn generate_token() -> Result<String, SessionError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::Entropy(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

pub(crate) fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

fn well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
