//! Turns a strategy outcome into exactly one effect: a session, a feedback
//! message, or a propagated fault.

use tracing::{error, info, warn};

use super::{
    error::AuthError,
    feedback::Feedback,
    session::{SessionManager, SessionToken},
    strategy::{AuthOutcome, Credentials, RejectReason, StrategyKind, StrategyRegistry},
    user::User,
};

pub const LOGGED_OUT: &str = "You have been logged out";

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    login_path: String,
    landing_path: String,
    uniform_rejections: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            landing_path: "/dashboard".to_string(),
            uniform_rejections: false,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    /// Show every rejection as "invalid email or password".
    #[must_use]
    pub fn with_uniform_rejections(mut self, uniform: bool) -> Self {
        self.uniform_rejections = uniform;
        self
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    #[must_use]
    pub fn uniform_rejections(&self) -> bool {
        self.uniform_rejections
    }

    #[must_use]
    pub fn reject_message(&self, reason: RejectReason) -> &'static str {
        if self.uniform_rejections {
            RejectReason::UNIFORM_MESSAGE
        } else {
            reason.message()
        }
    }
}

#[derive(Debug)]
pub enum Decision {
    Authenticated {
        user: User,
        token: SessionToken,
        redirect: String,
    },
    Rejected {
        reason: RejectReason,
        redirect: String,
    },
    Failed {
        cause: AuthError,
    },
}

pub struct Authenticator {
    registry: StrategyRegistry,
    sessions: SessionManager,
    config: PipelineConfig,
}

impl Authenticator {
    #[must_use]
    pub fn new(registry: StrategyRegistry, sessions: SessionManager, config: PipelineConfig) -> Self {
        Self {
            registry,
            sessions,
            config,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    #[must_use]
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run `kind` against `credentials`. On success any session the client
    /// already presented in `previous` is revoked before the new one is issued.
    pub async fn authenticate(
        &self,
        kind: StrategyKind,
        credentials: Credentials,
        previous: Option<&str>,
        feedback: &mut Feedback,
    ) -> Decision {
        let strategy = match self.registry.get(kind) {
            Ok(strategy) => strategy,
            Err(err) => return self.fail(kind, err.into()),
        };

        match strategy.verify(credentials).await {
            AuthOutcome::Success(user) => {
                if let Some(previous) = previous {
                    if let Err(err) = self.sessions.revoke(previous).await {
                        return self.fail(kind, err.into());
                    }
                }
                match self.sessions.establish(&user).await {
                    Ok(token) => {
                        info!("{kind} login succeeded for user {}", user.id);
                        feedback.clear();
                        Decision::Authenticated {
                            user,
                            token,
                            redirect: self.config.landing_path().to_string(),
                        }
                    }
                    Err(err) => self.fail(kind, err.into()),
                }
            }
            AuthOutcome::Rejected(reason) => {
                warn!("{kind} login rejected: {reason}");
                feedback.error(self.config.reject_message(reason));
                Decision::Rejected {
                    reason,
                    redirect: self.config.login_path().to_string(),
                }
            }
            AuthOutcome::Error(cause) => self.fail(kind, cause),
        }
    }

    /// Revoke the session behind `token`, then say so.
    ///
    /// # Errors
    /// Store faults; no feedback is written in that case.
    pub async fn logout(&self, token: &str, feedback: &mut Feedback) -> Result<(), AuthError> {
        self.sessions.revoke(token).await?;
        feedback.success(LOGGED_OUT);
        Ok(())
    }

    fn fail(&self, kind: StrategyKind, cause: AuthError) -> Decision {
        error!("{kind} login failed: {cause}");
        Decision::Failed { cause }
    }
}
