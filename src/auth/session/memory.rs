//! Process-wide session table. Sessions do not survive a restart and are not
//! shared between instances.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::SessionStore;
use crate::auth::store::{StoreError, UniqueKey};

struct Entry {
    user_id: Uuid,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<Vec<u8>, Entry>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until the next insert.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(
        &self,
        token_hash: &[u8],
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| StoreError::Unavailable(format!("session ttl {ttl:?} out of range")))?;
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));

        if entries.contains_key(token_hash) {
            return Err(StoreError::Duplicate(UniqueKey::SessionHash));
        }
        entries.insert(
            token_hash.to_vec(),
            Entry {
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn lookup(&self, token_hash: &[u8]) -> Result<Option<Uuid>, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(token_hash)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.user_id))
    }

    async fn delete(&self, token_hash: &[u8]) -> Result<(), StoreError> {
        self.entries.write().await.remove(token_hash);
        Ok(())
    }
}
