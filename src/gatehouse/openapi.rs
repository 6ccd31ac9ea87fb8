use utoipa::OpenApi;

use super::handlers::{dashboard, google, health, login, logout, register, root};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        root::root,
        register::register_form,
        register::register,
        login::login_form,
        login::login,
        google::start,
        google::callback,
        logout::logout,
        dashboard::dashboard,
    ),
    components(schemas(health::Health, login::LoginForm, crate::auth::RegistrationForm)),
    tags(
        (name = "auth", description = "Registration, login and logout"),
        (name = "pages", description = "HTML pages"),
        (name = "health", description = "Liveness")
    )
)]
struct ApiDoc;

/// `OpenAPI` document served at `/api-docs/openapi.json`.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
