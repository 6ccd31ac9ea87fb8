//! The principal record.

use serde::Serialize;
use uuid::Uuid;

/// A stored user. Exactly what the credential store persists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: Option<String>,
    pub google_subject: Option<String>,
}

impl User {
    /// Local accounts carry a password hash; Google-only accounts do not.
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Projection safe to hand to templates and logs.
    #[must_use]
    pub fn to_view(&self) -> UserView {
        UserView {
            id: self.id.to_string(),
            email: self.email.clone(),
            username: self.username.clone(),
            provider: if self.google_subject.is_some() {
                "google"
            } else {
                "local"
            },
        }
    }
}

/// Fields needed to create a user; the store assigns the id.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: Option<String>,
    pub google_subject: Option<String>,
}

impl NewUser {
    #[must_use]
    pub fn into_user(self, id: Uuid) -> User {
        User {
            id,
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            google_subject: self.google_subject,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub username: String,
    pub provider: &'static str,
}

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn view_never_carries_the_hash() {
        let user = NewUser {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
            google_subject: None,
        }
        .into_user(Uuid::nil());

        let view = serde_json::to_value(user.to_view()).unwrap_or_default();
        assert_eq!(view["provider"], "local");
        assert!(!view.to_string().contains("argon2id"));
    }

    #[test]
    fn google_users_have_no_password() {
        let user = NewUser {
            email: "bob@example.com".to_string(),
            username: "Bob".to_string(),
            password_hash: None,
            google_subject: Some("g-42".to_string()),
        }
        .into_user(Uuid::new_v4());
        assert!(!user.has_password());
        assert_eq!(user.to_view().provider, "google");
    }
}
