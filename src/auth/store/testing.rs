//! Store doubles shared by unit tests.

use async_trait::async_trait;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::auth::user::{NewUser, User};

/// Every call fails as if the backend were unreachable.
pub(crate) struct DownStore;

fn down() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl CredentialStore for DownStore {
    async fn find_by_id(&self, _: Uuid) -> Result<Option<User>, StoreError> {
        Err(down())
    }

    async fn find_by_email(&self, _: &str) -> Result<Option<User>, StoreError> {
        Err(down())
    }

    async fn find_by_google_subject(&self, _: &str) -> Result<Option<User>, StoreError> {
        Err(down())
    }

    async fn insert(&self, _: NewUser) -> Result<User, StoreError> {
        Err(down())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(down())
    }

    fn backend(&self) -> &'static str {
        "down"
    }
}
