use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::Response,
    Form,
};
use std::sync::Arc;
use tracing::{error, info};

use super::{failure, page, see_other, RequestContext};
use crate::{
    auth::{RegistrationForm, RegistrationOutcome},
    gatehouse::{
        state::{AppState, LOGIN_PATH, REGISTER_PATH},
        views::View,
    },
};

pub const REGISTERED: &str = "User registered successfully! Please log in.";
pub const ALREADY_REGISTERED: &str = "An account with that email already exists";

#[utoipa::path(
    get,
    path = "/register",
    responses(
        (status = 200, description = "Registration form", content_type = "text/html")
    ),
    tag = "pages"
)]
pub async fn register_form(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    let mut request = RequestContext::from_headers(&headers);
    page(&state, View::Register, None, &mut request.feedback, StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegistrationForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "To `/login` when registered, back to `/register` otherwise"),
        (status = 500, description = "Store or hashing fault")
    ),
    tag = "auth"
)]
pub async fn register(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Form(form): Form<RegistrationForm>,
) -> Response {
    let mut request = RequestContext::from_headers(&headers);

    match state.registrar().register(form).await {
        Ok(RegistrationOutcome::Registered(user)) => {
            info!("Registration completed for user {}", user.id);
            request.feedback.success(REGISTERED);
            see_other(&state, &request.feedback, LOGIN_PATH)
        }
        Ok(RegistrationOutcome::Duplicate) => {
            request.feedback.error(ALREADY_REGISTERED);
            see_other(&state, &request.feedback, REGISTER_PATH)
        }
        Ok(RegistrationOutcome::Invalid(message)) => {
            request.feedback.error(message);
            see_other(&state, &request.feedback, REGISTER_PATH)
        }
        Err(err) => {
            error!("Registration failed: {err}");
            failure(&state)
        }
    }
}
