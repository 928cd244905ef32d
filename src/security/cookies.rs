// ABOUTME: Session cookie construction and request cookie parsing
// ABOUTME: LTI sessions need SameSite=None to survive the platform's cross-site form post
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::constants::cookies::SESSION_COOKIE_NAME;
use http::header::COOKIE;
use http::HeaderMap;

/// `SameSite` attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Sent on cross-site requests; requires `Secure` in browsers
    None,
    /// Sent on top-level navigations only
    Lax,
}

impl SameSite {
    const fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Lax => "Lax",
        }
    }
}

/// Format a `Set-Cookie` value for the session cookie
#[must_use]
pub fn session_cookie(token: &str, max_age_secs: i64, same_site: SameSite, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE_NAME}={token}; HttpOnly{secure}; Path=/; SameSite={}; Max-Age={}",
        same_site.as_str(),
        max_age_secs.max(0)
    )
}

/// Format a `Set-Cookie` value that clears the session cookie
#[must_use]
pub fn expired_session_cookie(same_site: SameSite, secure: bool) -> String {
    session_cookie("", 0, same_site, secure)
}

/// Find a cookie value across all `Cookie` headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_lti_session_cookie_attributes() {
        let cookie = session_cookie("abc", 3600, SameSite::None, true);
        assert_eq!(
            cookie,
            "coursedesk_session=abc; HttpOnly; Secure; Path=/; SameSite=None; Max-Age=3600"
        );
    }

    #[test]
    fn test_insecure_development_cookie() {
        let cookie = session_cookie("abc", 60, SameSite::Lax, false);
        assert!(!cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
    }

    #[test]
    fn test_expired_cookie() {
        let cookie = expired_session_cookie(SameSite::Lax, true);
        assert!(cookie.starts_with("coursedesk_session=;"));
        assert!(cookie.ends_with("Max-Age=0"));
    }

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; coursedesk_session=tok123"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(
            get_cookie_value(&headers, SESSION_COOKIE_NAME).as_deref(),
            Some("tok123")
        );
        assert_eq!(get_cookie_value(&headers, "other").as_deref(), Some("1"));
        assert!(get_cookie_value(&headers, "missing").is_none());

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("coursedesk_session="));
        assert!(get_cookie_value(&headers, SESSION_COOKIE_NAME).is_none());
    }
}
