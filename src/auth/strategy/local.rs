//! Email + password verification against the credential store.

use std::sync::Arc;
use tracing::debug;

use super::{AuthOutcome, RejectReason};
use crate::auth::{
    error::AuthError,
    password::PasswordHasher,
    store::CredentialStore,
    user::normalize_email,
};

pub struct LocalStrategy {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
}

impl LocalStrategy {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Look the user up by normalized email and check the password.
    ///
    /// Rejection branches that never reach a real hash comparison still burn
    /// one dummy verification, so all three reasons cost about the same.
    pub async fn verify(&self, email: &str, password: &str) -> AuthOutcome {
        let email = normalize_email(email);

        let user = match self.store.find_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("local login: no user for {email}");
                return self.reject_after_dummy(password, RejectReason::UserNotFound).await;
            }
            Err(err) => return AuthOutcome::Error(err.into()),
        };

        let Some(stored) = user.password_hash.as_deref() else {
            debug!("local login: {email} has no password, only an external identity");
            return self
                .reject_after_dummy(password, RejectReason::MethodMismatch)
                .await;
        };

        match self.hasher.verify_async(password, stored).await {
            Ok(true) => AuthOutcome::Success(user),
            Ok(false) => AuthOutcome::Rejected(RejectReason::InvalidPassword),
            Err(err) => AuthOutcome::Error(AuthError::Hash(err)),
        }
    }

    async fn reject_after_dummy(&self, password: &str, reason: RejectReason) -> AuthOutcome {
        match self.hasher.verify_dummy(password).await {
            Ok(()) => AuthOutcome::Rejected(reason),
            Err(err) => AuthOutcome::Error(AuthError::Hash(err)),
        }
    }
}
