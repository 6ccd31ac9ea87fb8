use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::IntoParams;

use super::{failure, login::respond, see_other, RequestContext};
use crate::{
    auth::{Credentials, StrategyKind},
    gatehouse::state::{AppState, LOGIN_PATH},
    oauth::HandshakeError,
};

pub const HANDSHAKE_EXPIRED: &str = "Google sign-in expired, please try again";
pub const HANDSHAKE_FAILED: &str = "Google sign-in failed";

#[derive(Deserialize, IntoParams)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    /// Set by the provider when the user declined or the request was invalid.
    error: Option<String>,
}

#[utoipa::path(
    get,
    path = "/auth/google",
    responses(
        (status = 303, description = "To Google's consent screen"),
        (status = 404, description = "Google sign-in is not configured")
    ),
    tag = "auth"
)]
pub async fn start(state: Extension<Arc<AppState>>) -> Response {
    let Some(google) = state.google() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match google.authorize_url().await {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(err) => {
            error!("Failed to start Google handshake: {err}");
            failure(&state)
        }
    }
}

#[utoipa::path(
    get,
    path = "/auth/google/callback",
    params(CallbackParams),
    responses(
        (status = 303, description = "To `/dashboard` with a session cookie, or to `/login` with feedback"),
        (status = 404, description = "Google sign-in is not configured"),
        (status = 500, description = "Store fault while provisioning the user")
    ),
    tag = "auth"
)]
pub async fn callback(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(google) = state.google() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut request = RequestContext::from_headers(&headers);

    if let Some(reason) = params.error {
        warn!("Google handshake refused: {reason}");
        request.feedback.strategy_error(reason);
        return see_other(&state, &request.feedback, LOGIN_PATH);
    }

    let (Some(code), Some(csrf_state)) = (params.code, params.state) else {
        request.feedback.strategy_error(HANDSHAKE_FAILED);
        return see_other(&state, &request.feedback, LOGIN_PATH);
    };

    let profile = match google.exchange(&code, &csrf_state).await {
        Ok(profile) => profile,
        Err(err) => {
            warn!("Google handshake failed: {err}");
            let message = match err {
                HandshakeError::UnknownState => HANDSHAKE_EXPIRED,
                _ => HANDSHAKE_FAILED,
            };
            request.feedback.strategy_error(message);
            return see_other(&state, &request.feedback, LOGIN_PATH);
        }
    };

    let decision = state
        .authenticator()
        .authenticate(
            StrategyKind::Google,
            Credentials::Google(profile),
            request.token.as_deref(),
            &mut request.feedback,
        )
        .await;
    respond(&state, &request.feedback, decision)
}
