//! Gate for protected resources.

use super::{feedback::Feedback, session::SessionState, user::User};

pub const LOGIN_REQUIRED: &str = "please log in first";

#[derive(Debug, PartialEq, Eq)]
pub enum Guard<'a> {
    Proceed(&'a User),
    RedirectToLogin(String),
}

/// Call before any side effect of a protected handler.
pub fn require_authenticated<'a>(
    state: &'a SessionState,
    feedback: &mut Feedback,
    login_path: &str,
) -> Guard<'a> {
    match state {
        SessionState::Authenticated(user) => Guard::Proceed(user),
        SessionState::Anonymous => {
            feedback.error(LOGIN_REQUIRED);
            Guard::RedirectToLogin(login_path.to_string())
        }
    }
}
