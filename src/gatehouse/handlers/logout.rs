use axum::{extract::Extension, http::HeaderMap, response::Response};
use std::sync::Arc;
use tracing::error;

use super::{append_cookie, failure, see_other, RequestContext};
use crate::gatehouse::{
    cookies::clear_session_cookie,
    state::{AppState, LOGIN_PATH},
};

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session revoked, to `/login`"),
        (status = 500, description = "Session store fault; the cookie is still cleared")
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    let mut request = RequestContext::from_headers(&headers);

    // The redirect is only produced once the revoke has completed.
    let response = match request.token.as_deref() {
        Some(token) => match state.authenticator().logout(token, &mut request.feedback).await {
            Ok(()) => see_other(&state, &request.feedback, LOGIN_PATH),
            Err(err) => {
                error!("Failed to revoke session: {err}");
                failure(&state)
            }
        },
        None => see_other(&state, &request.feedback, LOGIN_PATH),
    };

    append_cookie(response, clear_session_cookie(state.config()))
}
