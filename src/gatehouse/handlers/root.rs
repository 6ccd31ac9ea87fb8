use axum::{extract::Extension, http::HeaderMap, response::Response};
use std::sync::Arc;
use tracing::error;

use super::{failure, see_other, RequestContext};
use crate::gatehouse::state::{AppState, DASHBOARD_PATH, LOGIN_PATH};

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 303, description = "To the dashboard when signed in, otherwise to the login page"),
        (status = 500, description = "Session store fault")
    ),
    tag = "pages"
)]
pub async fn root(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    let request = RequestContext::from_headers(&headers);
    match request.session(&state).await {
        Ok(session) if session.is_authenticated() => {
            see_other(&state, &request.feedback, DASHBOARD_PATH)
        }
        Ok(_) => see_other(&state, &request.feedback, LOGIN_PATH),
        Err(err) => {
            error!("Failed to resolve session: {err}");
            failure(&state)
        }
    }
}
