//! HTTP adapter: routes, cookies and views around the auth core.

pub mod cookies;
pub mod handlers;
mod openapi;
pub mod state;
pub mod views;

pub use openapi::openapi;
pub use state::{AppState, AuthConfig, Backends};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    routing::get,
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{store::apply_schema, PasswordHasher},
    oauth::{GoogleConfig, GoogleOAuth, Handshake},
};
use handlers::{dashboard, google, health, login, logout, register, root};

/// Every route, with tracing and request ids.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root::root))
        .route(
            "/register",
            get(register::register_form).post(register::register),
        )
        .route("/login", get(login::login_form).post(login::login))
        .route("/auth/google", get(google::start))
        .route("/auth/google/callback", get(google::callback))
        .route("/logout", get(logout::logout).post(logout::logout))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/health", get(health::health).options(health::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state)),
        )
}

/// Start the server
/// # Errors
/// Return error if the database, the Google client or the listener fail to set up
pub async fn new(
    port: u16,
    dsn: Option<String>,
    auth_config: AuthConfig,
    google_config: Option<GoogleConfig>,
) -> Result<()> {
    let backends = match dsn {
        Some(dsn) => {
            let pool = PgPoolOptions::new()
                .min_connections(1)
                .max_connections(5)
                .max_lifetime(Duration::from_secs(60 * 2))
                .test_before_acquire(true)
                .connect(&dsn)
                .await
                .context("Failed to connect to database")?;
            apply_schema(&pool)
                .await
                .context("Failed to apply database schema")?;
            Backends::postgres(pool)
        }
        None => {
            info!("No DSN given, using in-memory stores");
            Backends::memory()
        }
    };

    let google = match google_config {
        Some(config) => {
            let oauth = GoogleOAuth::new(&config).context("Failed to set up Google OAuth")?;
            info!("Google sign-in enabled, callback {}", config.redirect_url);
            Some(Arc::new(oauth) as Arc<dyn Handshake>)
        }
        None => None,
    };

    let state = AppState::new(auth_config, backends, PasswordHasher::new(), google)
        .context("Failed to register strategies")?;
    let app = router(Arc::new(state));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {err}");
                std::future::pending::<()>().await;
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
