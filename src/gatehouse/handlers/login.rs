use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::Response,
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::{append_cookie, failure, page, see_other, RequestContext};
use crate::{
    auth::{Credentials, Decision, Feedback, StrategyKind},
    gatehouse::{
        cookies::session_cookie,
        state::{AppState, DASHBOARD_PATH},
        views::View,
    },
};

#[derive(ToSchema, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login form", content_type = "text/html"),
        (status = 303, description = "Already signed in, to `/dashboard`"),
        (status = 500, description = "Session store fault")
    ),
    tag = "pages"
)]
pub async fn login_form(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    let mut request = RequestContext::from_headers(&headers);
    match request.session(&state).await {
        Ok(session) if session.is_authenticated() => {
            see_other(&state, &request.feedback, DASHBOARD_PATH)
        }
        Ok(_) => page(&state, View::Login, None, &mut request.feedback, StatusCode::OK),
        Err(err) => {
            error!("Failed to resolve session: {err}");
            failure(&state)
        }
    }
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "To `/dashboard` with a session cookie, or back to `/login` with feedback"),
        (status = 500, description = "Store or hashing fault")
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut request = RequestContext::from_headers(&headers);
    let credentials = Credentials::Local {
        email: form.email,
        password: form.password,
    };
    let decision = state
        .authenticator()
        .authenticate(
            StrategyKind::Local,
            credentials,
            request.token.as_deref(),
            &mut request.feedback,
        )
        .await;
    respond(&state, &request.feedback, decision)
}

/// Map a pipeline decision onto the wire. Shared with the Google callback.
pub(crate) fn respond(state: &AppState, feedback: &Feedback, decision: Decision) -> Response {
    match decision {
        Decision::Authenticated {
            token, redirect, ..
        } => {
            let response = see_other(state, feedback, &redirect);
            append_cookie(response, session_cookie(state.config(), token.as_str()))
        }
        Decision::Rejected { redirect, .. } => see_other(state, feedback, &redirect),
        Decision::Failed { .. } => failure(state),
    }
}
