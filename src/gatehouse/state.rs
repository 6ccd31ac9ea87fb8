//! Shared request state and its configuration.

use std::{sync::Arc, time::Duration};

use crate::{
    auth::{
        Authenticator, CredentialStore, GoogleStrategy, LocalStrategy, MemoryCredentialStore,
        MemorySessionStore, PasswordHasher, PgCredentialStore, PgSessionStore, PipelineConfig,
        Registrar, RegistryError, SessionManager, SessionStore, Strategy, StrategyRegistry,
    },
    oauth::Handshake,
};

use super::views::{TemplateRenderer, ViewRenderer};

pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 12 * 60 * 60;
pub const MAX_SESSION_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    base_url: String,
    session_ttl_seconds: u64,
    uniform_rejections: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            uniform_rejections: false,
        }
    }

    /// Clamped to `1..=MAX_SESSION_TTL_SECONDS`.
    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds.clamp(1, MAX_SESSION_TTL_SECONDS);
        self
    }

    #[must_use]
    pub fn with_uniform_rejections(mut self, uniform: bool) -> Self {
        self.uniform_rejections = uniform;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn uniform_rejections(&self) -> bool {
        self.uniform_rejections
    }

    /// Only mark cookies secure when the site is served over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Where users and sessions live.
#[derive(Clone)]
pub struct Backends {
    pub users: Arc<dyn CredentialStore>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Backends {
    /// Process-local stores. Nothing survives a restart.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryCredentialStore::new()),
            sessions: Arc::new(MemorySessionStore::new()),
        }
    }

    #[must_use]
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PgCredentialStore::new(pool.clone())),
            sessions: Arc::new(PgSessionStore::new(pool)),
        }
    }
}

pub struct AppState {
    config: AuthConfig,
    users: Arc<dyn CredentialStore>,
    authenticator: Authenticator,
    registrar: Registrar,
    google: Option<Arc<dyn Handshake>>,
    views: Arc<dyn ViewRenderer>,
}

impl AppState {
    /// Wire the core together. The Google strategy is registered only when a
    /// handshake is supplied.
    ///
    /// # Errors
    /// Fails if a strategy is registered twice.
    pub fn new(
        config: AuthConfig,
        backends: Backends,
        hasher: PasswordHasher,
        google: Option<Arc<dyn Handshake>>,
    ) -> Result<Self, RegistryError> {
        let Backends { users, sessions } = backends;

        let mut registry = StrategyRegistry::new();
        registry.register(Strategy::Local(LocalStrategy::new(
            Arc::clone(&users),
            hasher.clone(),
        )))?;
        if google.is_some() {
            registry.register(Strategy::Google(GoogleStrategy::new(Arc::clone(&users))))?;
        }

        let sessions = SessionManager::new(
            sessions,
            Arc::clone(&users),
            Duration::from_secs(config.session_ttl_seconds()),
        );
        let pipeline = PipelineConfig::new()
            .with_login_path(LOGIN_PATH)
            .with_landing_path(DASHBOARD_PATH)
            .with_uniform_rejections(config.uniform_rejections());

        Ok(Self {
            registrar: Registrar::new(Arc::clone(&users), hasher),
            authenticator: Authenticator::new(registry, sessions, pipeline),
            users,
            google,
            views: Arc::new(TemplateRenderer::new()),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn users(&self) -> &Arc<dyn CredentialStore> {
        &self.users
    }

    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        self.authenticator.sessions()
    }

    #[must_use]
    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    #[must_use]
    pub fn google(&self) -> Option<&Arc<dyn Handshake>> {
        self.google.as_ref()
    }

    #[must_use]
    pub fn google_enabled(&self) -> bool {
        self.google.is_some()
    }

    #[must_use]
    pub fn views(&self) -> &dyn ViewRenderer {
        self.views.as_ref()
    }
}
