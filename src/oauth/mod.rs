//! Provider handshakes. They end in a verified profile and never touch
//! sessions; the matching strategy decides what the profile means.

pub mod google;

pub use google::{GoogleConfig, GoogleOAuth};

use async_trait::async_trait;

use crate::auth::GoogleProfile;

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("invalid OAuth configuration: {0}")]
    Config(String),

    #[error("unknown or expired OAuth state")]
    UnknownState,

    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("failed to fetch user info: {0}")]
    UserInfo(#[from] reqwest::Error),

    #[error("provider returned an incomplete profile: {0}")]
    Profile(&'static str),
}

/// The two halves of an Authorization Code flow.
#[async_trait]
pub trait Handshake: Send + Sync {
    /// Start a flow: the URL to send the browser to.
    async fn authorize_url(&self) -> Result<String, HandshakeError>;

    /// Finish a flow. `state` is single use.
    async fn exchange(&self, code: &str, state: &str) -> Result<GoogleProfile, HandshakeError>;
}
