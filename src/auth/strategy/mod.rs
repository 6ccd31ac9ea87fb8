//! Authentication strategies and their registry.
//!
//! A strategy turns one kind of credential into an [`AuthOutcome`]. The set
//! is closed: [`Strategy`] is an enum, and callers select one by
//! [`StrategyKind`], which is parsed (and therefore validated) from the route
//! key before anything else happens.

mod google;
mod local;

pub use google::{GoogleProfile, GoogleStrategy};
pub use local::LocalStrategy;

use std::{collections::HashMap, fmt, str::FromStr};

use super::{error::AuthError, user::User};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Local,
    Google,
}

impl StrategyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = RegistryError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "local" => Ok(Self::Local),
            "google" => Ok(Self::Google),
            other => Err(RegistryError::UnknownKey(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown strategy key: {0}")]
    UnknownKey(String),

    #[error("strategy {0} is already registered")]
    AlreadyRegistered(StrategyKind),

    #[error("strategy {0} is not enabled")]
    NotRegistered(StrategyKind),
}

/// Why a strategy refused the credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    UserNotFound,
    /// Password login attempted on an account that only has a Google identity.
    MethodMismatch,
    InvalidPassword,
}

impl RejectReason {
    pub const UNIFORM_MESSAGE: &'static str = "invalid email or password";

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::UserNotFound => "user not found",
            Self::MethodMismatch => "use alternate login method",
            Self::InvalidPassword => "invalid password",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of one verify call. Rejections are data; only `Error` is a fault.
#[derive(Debug)]
pub enum AuthOutcome {
    Success(User),
    Rejected(RejectReason),
    Error(AuthError),
}

impl AuthOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Input handed to a strategy.
pub enum Credentials {
    Local { email: String, password: String },
    Google(GoogleProfile),
}

impl Credentials {
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Local { .. } => StrategyKind::Local,
            Self::Google(_) => StrategyKind::Google,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the password.
        match self {
            Self::Local { email, .. } => f
                .debug_struct("Local")
                .field("email", email)
                .finish_non_exhaustive(),
            Self::Google(profile) => f.debug_tuple("Google").field(profile).finish(),
        }
    }
}

pub enum Strategy {
    Local(LocalStrategy),
    Google(GoogleStrategy),
}

impl Strategy {
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Local(_) => StrategyKind::Local,
            Self::Google(_) => StrategyKind::Google,
        }
    }

    pub async fn verify(&self, credentials: Credentials) -> AuthOutcome {
        match (self, credentials) {
            (Self::Local(strategy), Credentials::Local { email, password }) => {
                strategy.verify(&email, &password).await
            }
            (Self::Google(strategy), Credentials::Google(profile)) => {
                strategy.verify(&profile).await
            }
            (strategy, _) => AuthOutcome::Error(AuthError::CredentialKind(strategy.kind())),
        }
    }
}

#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<StrategyKind, Strategy>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Each kind may be registered once.
    pub fn register(&mut self, strategy: Strategy) -> Result<(), RegistryError> {
        let kind = strategy.kind();
        if self.strategies.contains_key(&kind) {
            return Err(RegistryError::AlreadyRegistered(kind));
        }
        self.strategies.insert(kind, strategy);
        Ok(())
    }

    /// # Errors
    /// Returns `NotRegistered` when the deployment did not enable `kind`.
    pub fn get(&self, kind: StrategyKind) -> Result<&Strategy, RegistryError> {
        self.strategies
            .get(&kind)
            .ok_or(RegistryError::NotRegistered(kind))
    }

    #[must_use]
    pub fn is_enabled(&self, kind: StrategyKind) -> bool {
        self.strategies.contains_key(&kind)
    }
}
