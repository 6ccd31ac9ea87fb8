//! Find-or-create users from a verified Google profile.

use std::sync::Arc;
use tracing::{debug, info};

use super::AuthOutcome;
use crate::auth::{
    error::AuthError,
    store::{CredentialStore, StoreError, UniqueKey},
    user::{normalize_email, NewUser},
};

/// Identity returned by the provider after a completed handshake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoogleProfile {
    pub subject: String,
    pub display_name: String,
    pub email: String,
}

pub struct GoogleStrategy {
    store: Arc<dyn CredentialStore>,
}

impl GoogleStrategy {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// The provider already vouched for the profile, so this never rejects:
    /// it either finds the user, provisions one, or reports a store fault.
    pub async fn verify(&self, profile: &GoogleProfile) -> AuthOutcome {
        match self.store.find_by_google_subject(&profile.subject).await {
            Ok(Some(user)) => return AuthOutcome::Success(user),
            Ok(None) => {}
            Err(err) => return AuthOutcome::Error(err.into()),
        }

        let new_user = NewUser {
            email: normalize_email(&profile.email),
            username: profile.display_name.clone(),
            password_hash: None,
            google_subject: Some(profile.subject.clone()),
        };

        match self.store.insert(new_user).await {
            Ok(user) => {
                info!("provisioned user {} from google subject", user.id);
                AuthOutcome::Success(user)
            }
            // Another callback for the same subject won the insert.
            Err(StoreError::Duplicate(UniqueKey::GoogleSubject)) => {
                debug!("google subject insert lost a race, re-reading");
                match self.store.find_by_google_subject(&profile.subject).await {
                    Ok(Some(user)) => AuthOutcome::Success(user),
                    Ok(None) => AuthOutcome::Error(AuthError::LostRace(UniqueKey::GoogleSubject)),
                    Err(err) => AuthOutcome::Error(err.into()),
                }
            }
            Err(err) => AuthOutcome::Error(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::{testing::DownStore, MemoryCredentialStore};
    use crate::auth::user::User;
    use async_trait::async_trait;
    use uuid::Uuid;

    fn profile(subject: &str, email: &str) -> GoogleProfile {
        GoogleProfile {
            subject: subject.to_string(),
            display_name: "Bob".to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn first_callback_provisions_then_reuses() -> Result<(), StoreError> {
        let store = Arc::new(MemoryCredentialStore::new());
        let strategy = GoogleStrategy::new(store.clone());

        let first = match strategy.verify(&profile("g-42", "Bob@Example.com")).await {
            AuthOutcome::Success(user) => user,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(first.username, "Bob");
        assert_eq!(first.email, "bob@example.com");
        assert!(!first.has_password());

        let second = match strategy.verify(&profile("g-42", "bob@example.com")).await {
            AuthOutcome::Success(user) => user,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(first.id, second.id);
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_callbacks_create_one_user() {
        let store = Arc::new(MemoryCredentialStore::new());
        let strategy = Arc::new(GoogleStrategy::new(store.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let strategy = Arc::clone(&strategy);
                tokio::spawn(async move {
                    strategy
                        .verify(&profile("g-42", "bob@example.com"))
                        .await
                        .is_success()
                })
            })
            .collect();

        for task in tasks {
            assert!(matches!(task.await, Ok(true)));
        }
        assert_eq!(store.len().await, 1);
    }

    /// Reports "absent" on the first subject lookup, then behaves normally, so
    /// the insert always collides with a row written "concurrently".
    struct RacingStore {
        inner: MemoryCredentialStore,
        first_lookup: tokio::sync::Mutex<bool>,
    }

    #[async_trait]
    impl CredentialStore for RacingStore {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.inner.find_by_id(id).await
        }
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_by_email(email).await
        }
        async fn find_by_google_subject(&self, subject: &str) -> Result<Option<User>, StoreError> {
            let mut first = self.first_lookup.lock().await;
            if *first {
                *first = false;
                return Ok(None);
            }
            self.inner.find_by_google_subject(subject).await
        }
        async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
            self.inner.insert(user).await
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
        fn backend(&self) -> &'static str {
            "racing"
        }
    }

    #[tokio::test]
    async fn lost_insert_race_is_treated_as_found() -> Result<(), StoreError> {
        let inner = MemoryCredentialStore::new();
        let winner = inner
            .insert(NewUser {
                email: "bob@example.com".to_string(),
                username: "Bob".to_string(),
                password_hash: None,
                google_subject: Some("g-42".to_string()),
            })
            .await?;
        let store = Arc::new(RacingStore {
            inner,
            first_lookup: tokio::sync::Mutex::new(true),
        });

        let strategy = GoogleStrategy::new(store.clone());
        match strategy.verify(&profile("g-42", "bob@example.com")).await {
            AuthOutcome::Success(user) => assert_eq!(user.id, winner.id),
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(store.inner.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn email_owned_by_local_account_is_an_error() -> Result<(), StoreError> {
        let store = Arc::new(MemoryCredentialStore::new());
        store
            .insert(NewUser {
                email: "bob@example.com".to_string(),
                username: "bob".to_string(),
                password_hash: Some("hash".to_string()),
                google_subject: None,
            })
            .await?;

        let strategy = GoogleStrategy::new(store.clone());
        assert!(matches!(
            strategy.verify(&profile("g-42", "bob@example.com")).await,
            AuthOutcome::Error(AuthError::Store(StoreError::Duplicate(UniqueKey::Email)))
        ));
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn store_fault_is_an_error() {
        let strategy = GoogleStrategy::new(Arc::new(DownStore));
        assert!(matches!(
            strategy.verify(&profile("g-42", "bob@example.com")).await,
            AuthOutcome::Error(AuthError::Store(_))
        ));
    }
}
