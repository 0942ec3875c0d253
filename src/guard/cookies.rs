//! Session cookies read by the route guard

use crate::auth::{Session, UserRole};
use axum::http::{header, HeaderMap, HeaderValue};

pub const TOKEN_COOKIE: &str = "token";
pub const USER_TYPE_COOKIE: &str = "userType";
pub const PREFERRED_LANDING_COOKIE: &str = "preferredLandingPage";

const COOKIE_ATTRIBUTES: &str = "Path=/; SameSite=Lax";

/// The three cookies a routing decision depends on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteCookies {
    pub token: Option<String>,
    pub user_type: Option<String>,
    pub preferred_landing_page: Option<String>,
}

impl RouteCookies {
    /// Collect cookies from every `Cookie` header on a request
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = Self::default();
        for value in headers.get_all(header::COOKIE) {
            if let Ok(cookie_str) = value.to_str() {
                cookies.merge_header(cookie_str);
            }
        }
        cookies
    }

    /// Parse a single `Cookie` header value
    pub fn parse(cookie_header: &str) -> Self {
        let mut cookies = Self::default();
        cookies.merge_header(cookie_header);
        cookies
    }

    fn merge_header(&mut self, cookie_header: &str) {
        for cookie in cookie_header.split(';') {
            let Some((name, value)) = cookie.trim().split_once('=') else {
                continue;
            };
            let value = decode_value(value.trim());

            match name.trim() {
                TOKEN_COOKIE => self.token = Some(value),
                USER_TYPE_COOKIE => self.user_type = Some(value),
                PREFERRED_LANDING_COOKIE => self.preferred_landing_page = Some(value),
                _ => {}
            }
        }
    }

    /// The `token` cookie is present and non-empty
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Recognized role, `None` when missing or unknown
    pub fn role(&self) -> Option<UserRole> {
        self.user_type.as_deref().and_then(|v| v.parse().ok())
    }
}

/// Cookie values may be quoted or percent-encoded by the browser side
fn decode_value(raw: &str) -> String {
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(raw);

    if !unquoted.contains('%') {
        return unquoted.to_string();
    }

    url::form_urlencoded::parse(unquoted.as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
        .unwrap_or_else(|| unquoted.to_string())
}

/// `Set-Cookie` values that mirror a stored session for edge routing
pub fn session_cookies(session: &Session) -> Vec<String> {
    let mut cookies = Vec::new();
    if let Some(token) = session.access_token.as_deref().filter(|t| !t.is_empty()) {
        cookies.push(format!("{}={}; {}", TOKEN_COOKIE, token, COOKIE_ATTRIBUTES));
    }
    if let Some(role) = session.user_type {
        cookies.push(format!("{}={}; {}", USER_TYPE_COOKIE, role, COOKIE_ATTRIBUTES));
    }
    cookies
}

/// `Set-Cookie` values that expire the session cookies
pub fn clear_session_cookies() -> Vec<String> {
    [TOKEN_COOKIE, USER_TYPE_COOKIE]
        .iter()
        .map(|name| format!("{}=; Max-Age=0; {}", name, COOKIE_ATTRIBUTES))
        .collect()
}

/// Append `Set-Cookie` headers, skipping values that are not valid header text
pub fn append_set_cookies(headers: &mut HeaderMap, cookies: Vec<String>) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(_) => tracing::warn!("Skipping cookie with invalid header characters"),
        }
    }
}
