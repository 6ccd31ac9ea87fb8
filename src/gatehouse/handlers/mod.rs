//! Route handlers and the response plumbing they share.
//!
//! Every handler follows the same shape: load the session and pending
//! feedback from the request, do its work, then write both back. Feedback is
//! only re-sent when it changed.

pub mod dashboard;
pub mod google;
pub mod health;
pub mod login;
pub mod logout;
pub mod register;
pub mod root;

use axum::{
    http::{
        header::{InvalidHeaderValue, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::error;

use super::{
    cookies,
    state::AppState,
    views::{View, ViewContext},
};
use crate::auth::{Feedback, SessionError, SessionState, User};

/// Session token and pending feedback carried by one request.
pub(crate) struct RequestContext {
    pub token: Option<String>,
    pub feedback: Feedback,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            token: cookies::extract_session_token(headers),
            feedback: cookies::read_feedback(headers),
        }
    }

    pub async fn session(&self, state: &AppState) -> Result<SessionState, SessionError> {
        state.sessions().resolve(self.token.as_deref()).await
    }
}

/// 303 to `location`, carrying feedback.
pub(crate) fn see_other(state: &AppState, feedback: &Feedback, location: &str) -> Response {
    with_feedback(state, feedback, Redirect::to(location).into_response())
}

/// Render `view`, handing it every pending message.
pub(crate) fn page(
    state: &AppState,
    view: View,
    user: Option<&User>,
    feedback: &mut Feedback,
    status: StatusCode,
) -> Response {
    let context = ViewContext {
        user: user.map(User::to_view),
        feedback: feedback.take_all(),
        google_enabled: state.google_enabled(),
    };
    let response = match state.views().render(view, &context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            error!("Failed to render {view:?}: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };
    with_feedback(state, feedback, response)
}

/// The generic failure page. Pending feedback is left for the next page.
pub(crate) fn failure(state: &AppState) -> Response {
    let mut untouched = Feedback::new();
    page(
        state,
        View::Failure,
        None,
        &mut untouched,
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

pub(crate) fn with_feedback(state: &AppState, feedback: &Feedback, response: Response) -> Response {
    match cookies::flash_cookie(state.config(), feedback) {
        Some(cookie) => append_cookie(response, cookie),
        None => response,
    }
}

pub(crate) fn append_cookie(
    mut response: Response,
    cookie: Result<HeaderValue, InvalidHeaderValue>,
) -> Response {
    match cookie {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(err) => error!("Failed to build cookie: {err}"),
    }
    response
}
