//! # Gatehouse
//!
//! `gatehouse` signs users in with either an email and password or a Google
//! account and keeps them signed in with a server-side session.
//!
//! ## Layout
//!
//! - [`auth`]: the authentication core. Credential store, password hashing,
//!   the `local` and `google` strategies, session lifecycle, the outcome
//!   pipeline, one-shot feedback messages and the protected-resource guard.
//! - [`oauth`]: the Google Authorization Code + PKCE handshake. It hands a
//!   verified profile to the `google` strategy and never touches sessions.
//! - [`gatehouse`]: the axum adapter (routes, cookies, views).
//! - [`cli`]: command line, telemetry and the `server` action.
//!
//! ## Sessions
//!
//! Session tokens are 32 random bytes, base64url encoded. Only the SHA-256 of
//! a token is persisted, so a leaked `user_sessions` table cannot be replayed.

pub mod auth;
pub mod cli;
pub mod gatehouse;
pub mod oauth;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_commit_hash_is_hex_or_unknown() {
        if GIT_COMMIT_HASH == "unknown" {
            return;
        }
        assert!(GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn app_user_agent_has_name_and_version() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }
}
