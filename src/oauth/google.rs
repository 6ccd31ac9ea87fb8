//! # Google OAuth 2.0, Authorization Code + PKCE
//!
//! 1. [`authorize_url`](GoogleOAuth::authorize_url) asks for `openid`, `email`
//!    and `profile`, attaches an S256 PKCE challenge and remembers the CSRF
//!    state with its verifier for ten minutes.
//! 2. [`exchange`](GoogleOAuth::exchange) consumes the state (once), trades
//!    the code for an access token and reads the `v2/userinfo` endpoint.
//!
//! Pending states live in process memory, so the callback must reach the
//! instance that issued the redirect.

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::{debug, Instrument};

use super::{Handshake, HandshakeError};
use crate::auth::GoogleProfile;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const STATE_TTL: Duration = Duration::from_secs(600);

type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_url: String,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("redirect_url", &self.redirect_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

impl GoogleUser {
    fn into_profile(self) -> Result<GoogleProfile, HandshakeError> {
        let email = self
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or(HandshakeError::Profile("missing email"))?;
        if self.id.is_empty() {
            return Err(HandshakeError::Profile("missing id"));
        }
        let display_name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => email.clone(),
        };
        Ok(GoogleProfile {
            subject: self.id,
            display_name,
            email,
        })
    }
}

struct PendingState {
    verifier: String,
    expires_at: Instant,
}

pub struct GoogleOAuth {
    client: ConfiguredClient,
    http: reqwest::Client,
    pending: Mutex<HashMap<String, PendingState>>,
}

impl GoogleOAuth {
    /// # Errors
    /// Fails on an unparseable redirect URL or if the HTTP client cannot be built.
    pub fn new(config: &GoogleConfig) -> Result<Self, HandshakeError> {
        let auth_url =
            AuthUrl::new(AUTH_URL.to_string()).map_err(|e| HandshakeError::Config(e.to_string()))?;
        let token_url =
            TokenUrl::new(TOKEN_URL.to_string()).map_err(|e| HandshakeError::Config(e.to_string()))?;
        let redirect_url = RedirectUrl::new(config.redirect_url.clone())
            .map_err(|e| HandshakeError::Config(format!("redirect url: {e}")))?;

        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(
                config.client_secret.expose_secret().to_string(),
            ))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        // Token endpoints must not be followed through redirects.
        let http = reqwest::ClientBuilder::new()
            .user_agent(crate::APP_USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HandshakeError::Config(e.to_string()))?;

        Ok(Self {
            client,
            http,
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// Number of flows started and not yet finished or expired.
    pub async fn pending_len(&self) -> usize {
        let now = Instant::now();
        self.pending
            .lock()
            .await
            .values()
            .filter(|pending| pending.expires_at > now)
            .count()
    }

    async fn take_verifier(&self, state: &str) -> Result<String, HandshakeError> {
        let pending = self.pending.lock().await.remove(state);
        match pending {
            Some(pending) if pending.expires_at > Instant::now() => Ok(pending.verifier),
            _ => Err(HandshakeError::UnknownState),
        }
    }
}

#[async_trait]
impl Handshake for GoogleOAuth {
    async fn authorize_url(&self) -> Result<String, HandshakeError> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        let now = Instant::now();
        let mut pending = self.pending.lock().await;
        pending.retain(|_, entry| entry.expires_at > now);
        pending.insert(
            csrf_state.secret().clone(),
            PendingState {
                verifier: pkce_verifier.secret().clone(),
                expires_at: now + STATE_TTL,
            },
        );

        Ok(auth_url.to_string())
    }

    async fn exchange(&self, code: &str, state: &str) -> Result<GoogleProfile, HandshakeError> {
        // Unknown or stale state fails before any network call.
        let verifier = self.take_verifier(state).await?;

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(verifier))
            .request_async(&self.http)
            .instrument(tracing::info_span!("oauth.token", provider = "google"))
            .await
            .map_err(|e| HandshakeError::Exchange(e.to_string()))?;

        let user: GoogleUser = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .instrument(tracing::info_span!("oauth.userinfo", provider = "google"))
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!("google handshake completed for subject {}", user.id);
        user.into_profile()
    }
}
