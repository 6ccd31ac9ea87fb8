//! Session and feedback cookies.

use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};

use super::state::AuthConfig;
use crate::auth::Feedback;

pub const SESSION_COOKIE_NAME: &str = "gatehouse_session";
pub const FLASH_COOKIE_NAME: &str = "gatehouse_flash";

/// `HttpOnly` cookie carrying the session token.
pub fn session_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(
        config,
        SESSION_COOKIE_NAME,
        token,
        config.session_ttl_seconds(),
    )
}

pub fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(config, SESSION_COOKIE_NAME, "", 0)
}

/// Cookie update for pending feedback, or `None` when nothing changed.
///
/// Session-scoped (no `Max-Age`) while messages are pending, expired once
/// they have all been taken.
pub fn flash_cookie(
    config: &AuthConfig,
    feedback: &Feedback,
) -> Option<Result<HeaderValue, InvalidHeaderValue>> {
    if !feedback.is_changed() {
        return None;
    }
    Some(match feedback.encode() {
        Some(encoded) => {
            let mut cookie =
                format!("{FLASH_COOKIE_NAME}={encoded}; Path=/; HttpOnly; SameSite=Lax");
            if config.session_cookie_secure() {
                cookie.push_str("; Secure");
            }
            HeaderValue::from_str(&cookie)
        }
        None => build_cookie(config, FLASH_COOKIE_NAME, "", 0),
    })
}

fn build_cookie(
    config: &AuthConfig,
    name: &str,
    value: &str,
    max_age: u64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Session token from `Authorization: Bearer` or the session cookie.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    extract_cookie(headers, SESSION_COOKIE_NAME).filter(|token| !token.is_empty())
}

/// Pending feedback carried by the request, empty if there is none.
pub fn read_feedback(headers: &HeaderMap) -> Feedback {
    extract_cookie(headers, FLASH_COOKIE_NAME)
        .filter(|value| !value.is_empty())
        .map_or_else(Feedback::new, |value| Feedback::decode(&value))
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    // Browsers may send several Cookie headers over HTTP/2.
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| val.trim().to_string())
        })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            if let (Ok(name), Ok(value)) = (
                name.parse::<axum::http::HeaderName>(),
                HeaderValue::from_str(value),
            ) {
                map.append(name, value);
            }
        }
        map
    }

    #[test]
    fn session_cookie_attributes() {
        let config = AuthConfig::new("http://localhost:8080".to_string()).with_session_ttl_seconds(60);
        let cookie = session_cookie(&config, "tok").ok();
        assert_eq!(
            cookie.as_ref().and_then(|c| c.to_str().ok()),
            Some("gatehouse_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=60")
        );

        let secure = AuthConfig::new("https://auth.example.com".to_string());
        let cookie = clear_session_cookie(&secure).ok();
        assert_eq!(
            cookie.as_ref().and_then(|c| c.to_str().ok()),
            Some("gatehouse_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure")
        );
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let map = headers(&[
            ("cookie", "gatehouse_session=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(extract_session_token(&map).as_deref(), Some("from-header"));
    }

    #[test]
    fn cookie_found_among_others() {
        let map = headers(&[("cookie", "theme=dark; gatehouse_session=abc ; x=1")]);
        assert_eq!(extract_session_token(&map).as_deref(), Some("abc"));
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
        assert_eq!(
            extract_session_token(&headers(&[("cookie", "gatehouse_session=")])),
            None
        );
    }

    #[test]
    fn flash_cookie_round_trip_then_clear() {
        let config = AuthConfig::new("http://localhost:8080".to_string());
        let mut feedback = Feedback::new();
        assert!(flash_cookie(&config, &feedback).is_none());

        feedback.error("invalid password");
        let Some(Ok(set)) = flash_cookie(&config, &feedback) else {
            panic!("pending feedback must produce a cookie");
        };
        let set = set.to_str().unwrap_or_default().to_string();
        let pair = set.split(';').next().unwrap_or_default();

        let mut restored = read_feedback(&headers(&[("cookie", pair)]));
        assert_eq!(restored.take_all().error, vec!["invalid password"]);

        let Some(Ok(cleared)) = flash_cookie(&config, &restored) else {
            panic!("taken feedback must clear the cookie");
        };
        assert!(cleared.to_str().unwrap_or_default().contains("Max-Age=0"));
    }
}
