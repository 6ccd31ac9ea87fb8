//! Map parsed arguments to an action.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, google};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if arguments are inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .filter(|dsn| !dsn.trim().is_empty());

    let auth_opts = auth::Options::parse(matches)?;
    let google = google::parse(matches, &auth_opts.base_url)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        base_url: auth_opts.base_url,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        uniform_rejections: auth_opts.uniform_rejections,
        google,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(args: &[&str]) -> Result<Action> {
        temp_env::with_vars(
            [
                ("GATEHOUSE_DSN", None::<&str>),
                ("GATEHOUSE_BASE_URL", None::<&str>),
                ("GATEHOUSE_SESSION_TTL_SECONDS", None::<&str>),
                ("GATEHOUSE_GOOGLE_CLIENT_ID", None::<&str>),
                ("GATEHOUSE_GOOGLE_CLIENT_SECRET", None::<&str>),
                ("GATEHOUSE_GOOGLE_REDIRECT_URL", None::<&str>),
            ],
            || handler(&crate::cli::commands::new().get_matches_from(args)),
        )
    }

    #[test]
    fn defaults_to_memory_without_google() -> Result<()> {
        let Action::Server(args) = action(&["gatehouse"])?;
        assert_eq!(args.port, 8080);
        assert!(args.dsn.is_none());
        assert_eq!(args.base_url, "http://localhost:8080");
        assert_eq!(args.session_ttl_seconds, 43200);
        assert!(!args.uniform_rejections);
        assert!(args.google.is_none());
        Ok(())
    }

    #[test]
    fn google_enabled_with_both_credentials() -> Result<()> {
        let Action::Server(args) = action(&[
            "gatehouse",
            "--base-url",
            "https://auth.example.com",
            "--google-client-id",
            "id",
            "--google-client-secret",
            "secret",
        ])?;
        let Some(google) = args.google else {
            panic!("google should be configured");
        };
        assert_eq!(
            google.redirect_url,
            "https://auth.example.com/auth/google/callback"
        );
        Ok(())
    }

    #[test]
    fn empty_dsn_means_memory() -> Result<()> {
        let Action::Server(args) = action(&["gatehouse", "--dsn", " "])?;
        assert!(args.dsn.is_none());
        Ok(())
    }
}
