//! Authentication core.
//!
//! Flow for one login attempt:
//!
//! 1. The HTTP layer parses a [`StrategyKind`] and builds [`Credentials`].
//! 2. [`Authenticator::authenticate`] looks the strategy up in the
//!    [`StrategyRegistry`] and runs it against the [`CredentialStore`].
//! 3. `Success` establishes a session through the [`SessionManager`];
//!    `Rejected` writes a message to [`Feedback`]; `Error` is logged and
//!    surfaced as [`Decision::Failed`].
//!
//! Later requests resolve their token with [`SessionManager::resolve`] and
//! gate protected pages with [`require_authenticated`].

pub mod error;
pub mod feedback;
pub mod guard;
pub mod password;
pub mod pipeline;
pub mod registration;
pub mod session;
pub mod store;
pub mod strategy;
pub mod user;

pub use error::AuthError;
pub use feedback::{Feedback, FeedbackKind, FeedbackView};
pub use guard::{require_authenticated, Guard};
pub use password::{HashError, PasswordHasher};
pub use pipeline::{Authenticator, Decision, PipelineConfig};
pub use registration::{Registrar, RegistrationForm, RegistrationOutcome};
pub use session::{
    MemorySessionStore, PgSessionStore, SessionError, SessionManager, SessionState, SessionStore,
    SessionToken,
};
pub use store::{CredentialStore, MemoryCredentialStore, PgCredentialStore, StoreError, UniqueKey};
pub use strategy::{
    AuthOutcome, Credentials, GoogleProfile, GoogleStrategy, LocalStrategy, RejectReason,
    RegistryError, Strategy, StrategyKind, StrategyRegistry,
};
pub use user::{User, UserView};
