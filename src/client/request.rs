//! Request descriptors and response helpers for the API client

use crate::error::Error;
use reqwest::Method;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Maximum number of error body characters surfaced to callers
const MAX_ERROR_CHARS: usize = 200;

/// How a request reacts to authorization failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthFlow {
    /// A 401 triggers one shared refresh and a single retry
    #[default]
    Session,
    /// Login / registration: a 400, 401 or 403 means bad credentials, never refresh
    Credentials,
    /// No refresh and no special status mapping
    Bare,
}

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    /// Deadline for each dispatch of this call
    pub timeout: Option<Duration>,
    pub flow: AuthFlow,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> crate::Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn flow(mut self, flow: AuthFlow) -> Self {
        self.flow = flow;
        self
    }

    /// Mark as a login/registration call
    pub fn credentials(self) -> Self {
        self.flow(AuthFlow::Credentials)
    }
}

/// One logical outbound call. Dispatched once, and at most once more after a refresh.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: Uuid,
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub retried: bool,
}

impl PendingRequest {
    pub fn new(method: Method, url: String, options: &RequestOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            url,
            headers: options.headers.clone(),
            body: options.body.clone(),
            retried: false,
        }
    }
}

/// Join a base URL and an endpoint path. Absolute endpoints are used as-is.
pub fn build_url(base_url: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }

    let base = base_url.trim().trim_end_matches('/');
    if base.is_empty() {
        endpoint.to_string()
    } else {
        format!("{}/{}", base, endpoint.trim_start_matches('/'))
    }
}

/// Map a transport failure, detecting timeouts
pub fn map_request_error(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        Error::Timeout(timeout)
    } else {
        Error::Network(format!("Unable to reach the server: {}", err))
    }
}

/// Backend message from an error body, or a generic status message
pub fn error_message(status: u16, body: &str) -> String {
    extract_message(body)
        .unwrap_or_else(|| format!("Request failed with status code {}", status))
}

/// Pull a human-readable message out of an error body
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => ["message", "detail", "error", "non_field_errors"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(message_text)
            .map(|text| truncate(&text)),
        Ok(serde_json::Value::String(text)) => Some(truncate(&text)),
        Ok(_) => None,
        // Plain text bodies are passed through, HTML error pages are not
        Err(_) if trimmed.starts_with('<') => None,
        Err(_) => Some(truncate(trimmed)),
    }
}

fn message_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        serde_json::Value::Array(items) => items.iter().find_map(message_text),
        _ => None,
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_CHARS).collect()
}
