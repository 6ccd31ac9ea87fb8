//! Process-local credential store for single-instance deployments and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError, UniqueKey};
use crate::auth::user::{NewUser, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    by_google_subject: HashMap<String, Uuid>,
}

impl Tables {
    fn lookup(&self, index: &HashMap<String, Uuid>, key: &str) -> Option<User> {
        index.get(key).and_then(|id| self.users.get(id)).cloned()
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.lookup(&tables.by_email, email))
    }

    async fn find_by_google_subject(&self, subject: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.lookup(&tables.by_google_subject, subject))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        // Both unique checks and the write happen under one write guard.
        let mut tables = self.tables.write().await;
        if tables.by_email.contains_key(&user.email) {
            return Err(StoreError::Duplicate(UniqueKey::Email));
        }
        if let Some(subject) = &user.google_subject {
            if tables.by_google_subject.contains_key(subject) {
                return Err(StoreError::Duplicate(UniqueKey::GoogleSubject));
            }
        }

        let user = user.into_user(Uuid::new_v4());
        tables.by_email.insert(user.email.clone(), user.id);
        if let Some(subject) = &user.google_subject {
            tables.by_google_subject.insert(subject.clone(), user.id);
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn local(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: "alice".to_string(),
            password_hash: Some("hash".to_string()),
            google_subject: None,
        }
    }

    fn google(email: &str, subject: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: "Bob".to_string(),
            password_hash: None,
            google_subject: Some(subject.to_string()),
        }
    }

    #[tokio::test]
    async fn insert_then_find_by_every_key() -> Result<(), StoreError> {
        let store = MemoryCredentialStore::new();
        let user = store.insert(google("bob@example.com", "g-42")).await?;

        assert_eq!(store.find_by_id(user.id).await?, Some(user.clone()));
        assert_eq!(
            store.find_by_email("bob@example.com").await?,
            Some(user.clone())
        );
        assert_eq!(store.find_by_google_subject("g-42").await?, Some(user));
        assert_eq!(store.find_by_email("nobody@example.com").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_writing() -> Result<(), StoreError> {
        let store = MemoryCredentialStore::new();
        store.insert(local("alice@example.com")).await?;

        let err = store.insert(local("alice@example.com")).await;
        assert!(matches!(err, Err(StoreError::Duplicate(UniqueKey::Email))));
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_subject_is_rejected() -> Result<(), StoreError> {
        let store = MemoryCredentialStore::new();
        store.insert(google("bob@example.com", "g-42")).await?;

        let err = store.insert(google("other@example.com", "g-42")).await;
        assert!(matches!(
            err,
            Err(StoreError::Duplicate(UniqueKey::GoogleSubject))
        ));
        assert_eq!(store.find_by_email("other@example.com").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_inserts_keep_email_unique() {
        let store = Arc::new(MemoryCredentialStore::new());
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(local("race@example.com")).await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if let Ok(Ok(_)) = task.await {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.len().await, 1);
    }
}
