use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use super::{failure, page, see_other, RequestContext};
use crate::{
    auth::{require_authenticated, Guard},
    gatehouse::{state::AppState, views::View},
};

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Landing page for signed-in users", content_type = "text/html"),
        (status = 303, description = "Not signed in, to `/login`"),
        (status = 500, description = "Session store fault")
    ),
    tag = "pages"
)]
pub async fn dashboard(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    let mut request = RequestContext::from_headers(&headers);
    let session = match request.session(&state).await {
        Ok(session) => session,
        Err(err) => {
            error!("Failed to resolve session: {err}");
            return failure(&state);
        }
    };

    let login_path = state.authenticator().config().login_path();
    match require_authenticated(&session, &mut request.feedback, login_path) {
        Guard::Proceed(user) => page(
            &state,
            View::Dashboard,
            Some(user),
            &mut request.feedback,
            StatusCode::OK,
        ),
        Guard::RedirectToLogin(path) => see_other(&state, &request.feedback, &path),
    }
}
