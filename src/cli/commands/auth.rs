use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::gatehouse::state::{DEFAULT_SESSION_TTL_SECONDS, MAX_SESSION_TTL_SECONDS};

pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_UNIFORM_REJECTIONS: &str = "uniform-rejections";

#[derive(Debug, Clone)]
pub struct Options {
    pub base_url: String,
    pub session_ttl_seconds: u64,
    pub uniform_rejections: bool,
}

impl Options {
    /// Parse session and login arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the session TTL is outside `1..=MAX_SESSION_TTL_SECONDS`.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let base_url = matches
            .get_one::<String>(ARG_BASE_URL)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "http://localhost:8080".to_string());

        let session_ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_SESSION_TTL_SECONDS);
        if !(1..=MAX_SESSION_TTL_SECONDS).contains(&session_ttl_seconds) {
            anyhow::bail!(
                "--{ARG_SESSION_TTL_SECONDS} must be between 1 and {MAX_SESSION_TTL_SECONDS}"
            );
        }

        Ok(Self {
            base_url,
            session_ttl_seconds,
            uniform_rejections: matches.get_flag(ARG_UNIFORM_REJECTIONS),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BASE_URL)
                .long(ARG_BASE_URL)
                .help("Public base URL, used for cookies and the OAuth callback")
                .env("GATEHOUSE_BASE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session lifetime in seconds, at most one year")
                .env("GATEHOUSE_SESSION_TTL_SECONDS")
                .default_value("43200")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_SESSION_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_UNIFORM_REJECTIONS)
                .long(ARG_UNIFORM_REJECTIONS)
                .help("Show one message for every failed login")
                .long_help(
                    "Show the same message for unknown accounts, wrong passwords and Google-only accounts, so the login form does not reveal which emails are registered.",
                )
                .env("GATEHOUSE_UNIFORM_REJECTIONS")
                .action(ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_matches(args: &[&str]) -> Result<ArgMatches, clap::Error> {
        temp_env::with_var("GATEHOUSE_SESSION_TTL_SECONDS", None::<&str>, || {
            with_args(Command::new("gatehouse")).try_get_matches_from(args)
        })
    }

    #[test]
    fn session_ttl_bounds() -> anyhow::Result<()> {
        let max = MAX_SESSION_TTL_SECONDS.to_string();
        let matches = try_matches(&["gatehouse", "--session-ttl-seconds", &max])?;
        assert_eq!(
            Options::parse(&matches)?.session_ttl_seconds,
            MAX_SESSION_TTL_SECONDS
        );

        let over = (MAX_SESSION_TTL_SECONDS + 1).to_string();
        for bad in ["0", over.as_str(), "18446744073709551615"] {
            let result = try_matches(&["gatehouse", "--session-ttl-seconds", bad]);
            assert_eq!(
                result.map_err(|e| e.kind()).err(),
                Some(clap::error::ErrorKind::ValueValidation),
                "{bad} should be rejected"
            );
        }
        Ok(())
    }

    #[test]
    fn uniform_rejections_flag() -> anyhow::Result<()> {
        let matches = temp_env::with_var("GATEHOUSE_UNIFORM_REJECTIONS", None::<&str>, || {
            try_matches(&["gatehouse", "--uniform-rejections"])
        })?;
        assert!(Options::parse(&matches)?.uniform_rejections);
        Ok(())
    }
}
