//! Credential store: the user table and its unique keys.
//!
//! Backends distinguish "not found" (`Ok(None)`) from faults (`Err`). Inserts
//! enforce uniqueness on `email` and `google_subject` and report the losing
//! key with [`StoreError::Duplicate`] so callers can retry as a lookup instead
//! of holding a global lock.

mod memory;
mod postgres;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryCredentialStore;
pub use postgres::{apply_schema, PgCredentialStore};
pub(crate) use postgres::{db_span, unique_violation};

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use super::user::{NewUser, User};

/// Unique indexes on the user table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueKey {
    Email,
    GoogleSubject,
    SessionHash,
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::GoogleSubject => write!(f, "google_subject"),
            Self::SessionHash => write!(f, "session_hash"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Duplicate(UniqueKey),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    #[must_use]
    pub fn is_duplicate(&self, key: UniqueKey) -> bool {
        matches!(self, Self::Duplicate(k) if *k == key)
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_google_subject(&self, subject: &str) -> Result<Option<User>, StoreError>;

    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Liveness check behind `/health`.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for health output.
    fn backend(&self) -> &'static str;
}
