//! Local account registration.

use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::info;
use utoipa::ToSchema;

use super::{
    error::AuthError,
    password::PasswordHasher,
    store::{CredentialStore, StoreError, UniqueKey},
    user::{normalize_email, NewUser, User},
};

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered(User),
    /// The email already belongs to an account. Nothing was written.
    Duplicate,
    /// Form failed validation; the message is safe to show.
    Invalid(&'static str),
}

pub struct Registrar {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
}

impl Registrar {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Validate, hash and insert. Does not establish a session.
    ///
    /// # Errors
    /// Store and hashing faults. Duplicates and bad input are outcomes.
    pub async fn register(
        &self,
        form: RegistrationForm,
    ) -> Result<RegistrationOutcome, AuthError> {
        let email = normalize_email(&form.email);
        if !valid_email(&email) {
            return Ok(RegistrationOutcome::Invalid("enter a valid email address"));
        }
        if form.password.is_empty() {
            return Ok(RegistrationOutcome::Invalid("password is required"));
        }

        if self.store.find_by_email(&email).await?.is_some() {
            return Ok(RegistrationOutcome::Duplicate);
        }

        let username = match form.username.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };
        let password_hash = self.hasher.hash_async(&form.password).await?;

        // No transaction: once the insert lands the account exists, even if
        // the client is gone before the response.
        match self
            .store
            .insert(NewUser {
                email,
                username,
                password_hash: Some(password_hash),
                google_subject: None,
            })
            .await
        {
            Ok(user) => {
                info!("registered user {}", user.id);
                Ok(RegistrationOutcome::Registered(user))
            }
            Err(StoreError::Duplicate(UniqueKey::Email)) => Ok(RegistrationOutcome::Duplicate),
            Err(err) => Err(err.into()),
        }
    }
}

fn valid_email(email_normalized: &str) -> bool {
    EMAIL_RE
        .as_ref()
        .is_some_and(|regex| regex.is_match(email_normalized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::test_hasher;
    use crate::auth::store::{testing::DownStore, MemoryCredentialStore};
    use async_trait::async_trait;
    use uuid::Uuid;

    fn form(username: &str, email: &str, password: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn email_format() {
        assert!(valid_email("alice@example.com"));
        assert!(!valid_email("alice@example"));
        assert!(!valid_email("alice example@example.com"));
        assert!(!valid_email(""));
    }

    #[tokio::test]
    async fn registers_with_hashed_password() -> Result<(), AuthError> {
        let store = Arc::new(MemoryCredentialStore::new());
        let hasher = test_hasher();
        let registrar = Registrar::new(store.clone(), hasher.clone());

        let outcome = registrar
            .register(form("alice", " Alice@Example.com ", "pw123"))
            .await?;
        let RegistrationOutcome::Registered(user) = outcome else {
            panic!("expected registration, got {outcome:?}");
        };
        assert_eq!(user.email, "alice@example.com");
        let Some(hash) = user.password_hash.as_deref() else {
            panic!("local user must carry a hash");
        };
        assert_ne!(hash, "pw123");
        assert!(hasher.verify("pw123", hash)?);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_leaves_store_untouched() -> Result<(), AuthError> {
        let store = Arc::new(MemoryCredentialStore::new());
        let registrar = Registrar::new(store.clone(), test_hasher());
        registrar
            .register(form("alice", "alice@example.com", "pw123"))
            .await?;

        let again = registrar
            .register(form("other", "ALICE@example.com", "different"))
            .await?;
        assert_eq!(again, RegistrationOutcome::Duplicate);
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn blank_username_defaults_to_local_part() -> Result<(), AuthError> {
        let registrar = Registrar::new(Arc::new(MemoryCredentialStore::new()), test_hasher());
        match registrar
            .register(form("  ", "carol@example.com", "pw"))
            .await?
        {
            RegistrationOutcome::Registered(user) => assert_eq!(user.username, "carol"),
            other => panic!("expected registration, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn invalid_input_is_reported_not_stored() -> Result<(), AuthError> {
        let store = Arc::new(MemoryCredentialStore::new());
        let registrar = Registrar::new(store.clone(), test_hasher());

        assert!(matches!(
            registrar.register(form("a", "not-an-email", "pw")).await?,
            RegistrationOutcome::Invalid(_)
        ));
        assert!(matches!(
            registrar.register(form("a", "a@example.com", "")).await?,
            RegistrationOutcome::Invalid(_)
        ));
        assert!(store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn store_fault_propagates() {
        let registrar = Registrar::new(Arc::new(DownStore), test_hasher());
        assert!(matches!(
            registrar
                .register(form("a", "a@example.com", "pw"))
                .await,
            Err(AuthError::Store(_))
        ));
    }

    /// Misses the email on the first lookup, as if another registration
    /// landed between the pre-check and the insert.
    struct StaleEmailStore {
        inner: MemoryCredentialStore,
        first_lookup: tokio::sync::Mutex<bool>,
    }

    #[async_trait]
    impl CredentialStore for StaleEmailStore {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.inner.find_by_id(id).await
        }
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            let mut first = self.first_lookup.lock().await;
            if *first {
                *first = false;
                return Ok(None);
            }
            self.inner.find_by_email(email).await
        }
        async fn find_by_google_subject(&self, subject: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_by_google_subject(subject).await
        }
        async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
            self.inner.insert(user).await
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
        fn backend(&self) -> &'static str {
            "stale-email"
        }
    }

    #[tokio::test]
    async fn insert_collision_is_a_duplicate() -> Result<(), AuthError> {
        let inner = MemoryCredentialStore::new();
        let winner = inner
            .insert(NewUser {
                email: "alice@example.com".to_string(),
                username: "alice".to_string(),
                password_hash: Some("hash".to_string()),
                google_subject: None,
            })
            .await?;
        let store = Arc::new(StaleEmailStore {
            inner,
            first_lookup: tokio::sync::Mutex::new(true),
        });
        let registrar = Registrar::new(store.clone(), test_hasher());

        assert_eq!(
            registrar
                .register(form("mallory", "alice@example.com", "other"))
                .await?,
            RegistrationOutcome::Duplicate
        );
        assert_eq!(store.inner.len().await, 1);
        assert_eq!(
            store.inner.find_by_email("alice@example.com").await?,
            Some(winner)
        );
        Ok(())
    }
}
