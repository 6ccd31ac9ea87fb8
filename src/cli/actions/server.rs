use crate::{
    cli::telemetry,
    gatehouse::{self, AuthConfig},
    oauth::GoogleConfig,
};
use anyhow::Result;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub base_url: String,
    pub session_ttl_seconds: u64,
    pub uniform_rejections: bool,
    pub google: Option<GoogleConfig>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database, the Google client or the listener fail to set up.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        port = args.port,
        base_url = %args.base_url,
        session_ttl_seconds = args.session_ttl_seconds,
        uniform_rejections = args.uniform_rejections,
        postgres = args.dsn.is_some(),
        google = args.google.is_some(),
        "starting server"
    );

    let auth_config = AuthConfig::new(args.base_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_uniform_rejections(args.uniform_rejections);

    let result = gatehouse::new(args.port, args.dsn, auth_config, args.google).await;

    telemetry::shutdown_tracer();

    result
}
