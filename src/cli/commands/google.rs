use anyhow::bail;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::oauth::GoogleConfig;

pub const ARG_GOOGLE_CLIENT_ID: &str = "google-client-id";
pub const ARG_GOOGLE_CLIENT_SECRET: &str = "google-client-secret";
pub const ARG_GOOGLE_REDIRECT_URL: &str = "google-redirect-url";

const CALLBACK_PATH: &str = "/auth/google/callback";

/// Google client settings. `None` disables Google sign-in.
///
/// # Errors
/// Returns an error if only one of client id and secret is given.
pub fn parse(matches: &ArgMatches, base_url: &str) -> anyhow::Result<Option<GoogleConfig>> {
    let get_non_empty = |id: &str| {
        matches
            .get_one::<String>(id)
            .cloned()
            .filter(|v| !v.trim().is_empty())
    };

    let (client_id, client_secret) = match (
        get_non_empty(ARG_GOOGLE_CLIENT_ID),
        get_non_empty(ARG_GOOGLE_CLIENT_SECRET),
    ) {
        (Some(id), Some(secret)) => (id, secret),
        (None, None) => return Ok(None),
        (Some(_), None) => bail!("--{ARG_GOOGLE_CLIENT_ID} requires --{ARG_GOOGLE_CLIENT_SECRET}"),
        (None, Some(_)) => bail!("--{ARG_GOOGLE_CLIENT_SECRET} requires --{ARG_GOOGLE_CLIENT_ID}"),
    };

    let redirect_url = get_non_empty(ARG_GOOGLE_REDIRECT_URL).unwrap_or_else(|| {
        format!("{}{CALLBACK_PATH}", base_url.trim_end_matches('/'))
    });

    Ok(Some(GoogleConfig {
        client_id,
        client_secret: SecretString::from(client_secret),
        redirect_url,
    }))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_ID)
                .long(ARG_GOOGLE_CLIENT_ID)
                .help("Google OAuth client id")
                .env("GATEHOUSE_GOOGLE_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_SECRET)
                .long(ARG_GOOGLE_CLIENT_SECRET)
                .help("Google OAuth client secret")
                .env("GATEHOUSE_GOOGLE_CLIENT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_GOOGLE_REDIRECT_URL)
                .long(ARG_GOOGLE_REDIRECT_URL)
                .help("OAuth callback URL (default: <base-url>/auth/google/callback)")
                .env("GATEHOUSE_GOOGLE_REDIRECT_URL"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn matches(args: &[&str]) -> ArgMatches {
        temp_env::with_vars(
            [
                ("GATEHOUSE_GOOGLE_CLIENT_ID", None::<&str>),
                ("GATEHOUSE_GOOGLE_CLIENT_SECRET", None::<&str>),
                ("GATEHOUSE_GOOGLE_REDIRECT_URL", None::<&str>),
            ],
            || with_args(Command::new("gatehouse")).get_matches_from(args),
        )
    }

    #[test]
    fn disabled_without_credentials() -> anyhow::Result<()> {
        assert!(parse(&matches(&["gatehouse"]), "http://localhost:8080")?.is_none());
        Ok(())
    }

    #[test]
    fn redirect_defaults_to_base_url() -> anyhow::Result<()> {
        let m = matches(&[
            "gatehouse",
            "--google-client-id",
            "id",
            "--google-client-secret",
            "secret",
        ]);
        let Some(config) = parse(&m, "https://auth.example.com/")? else {
            panic!("google should be enabled");
        };
        assert_eq!(config.client_id, "id");
        assert_eq!(config.client_secret.expose_secret(), "secret");
        assert_eq!(
            config.redirect_url,
            "https://auth.example.com/auth/google/callback"
        );
        Ok(())
    }

    #[test]
    fn half_configured_is_an_error() {
        let m = matches(&["gatehouse", "--google-client-id", "id"]);
        assert!(parse(&m, "http://localhost:8080").is_err());
    }
}
