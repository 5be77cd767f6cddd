//! Session cookie management.
//!
//! A single HTTP-only cookie carries the raw identity-provider credential.
//! There is no server-side session record: setting the cookie is the session.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::Config;

/// Builds and reads the session cookie with fixed attributes.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    name: String,
    max_age: Duration,
    secure: bool,
}

impl SessionCookies {
    pub fn new(name: impl Into<String>, max_age_secs: i64, secure: bool) -> Self {
        Self {
            name: name.into(),
            max_age: Duration::seconds(max_age_secs),
            secure,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.session.cookie_name.clone(),
            config.session.max_age_secs,
            config.is_production(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie holding `credential`, replacing any previous value.
    pub fn set_session(&self, credential: &str) -> Cookie<'static> {
        self.build(credential.to_string(), self.max_age)
    }

    /// Same cookie with an empty value and `Max-Age=0`.
    pub fn clear_session(&self) -> Cookie<'static> {
        self.build(String::new(), Duration::ZERO)
    }

    /// Credential from the jar; an empty value counts as absent.
    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    fn build(&self, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((self.name.clone(), value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};

    #[test]
    fn test_set_session_attributes() {
        let cookies = SessionCookies::new("token", 604_800, false);
        let rendered = cookies.set_session("abc.def.ghi").to_string();

        assert!(rendered.starts_with("token=abc.def.ghi"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=604800"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_secure_flag_in_production() {
        let cookies = SessionCookies::new("token", 604_800, true);
        assert!(cookies.set_session("x").to_string().contains("Secure"));
        assert!(cookies.clear_session().to_string().contains("Secure"));
    }

    #[test]
    fn test_clear_session_expires_immediately() {
        let cookies = SessionCookies::new("token", 604_800, false);
        let rendered = cookies.clear_session().to_string();

        assert!(rendered.starts_with("token=;"));
        assert!(rendered.contains("Max-Age=0"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Path=/"));
    }

    #[test]
    fn test_read_from_jar() {
        let cookies = SessionCookies::new("token", 604_800, false);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=cookie-token-456"),
        );
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(cookies.read(&jar), Some("cookie-token-456".to_string()));
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let cookies = SessionCookies::new("token", 604_800, false);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token="));
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(cookies.read(&jar), None);

        assert_eq!(cookies.read(&CookieJar::new()), None);
    }
}
