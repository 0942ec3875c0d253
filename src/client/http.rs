//! Authenticated API client with single-flight token refresh

use crate::auth::TokenStore;
use crate::client::request::{
    build_url, error_message, map_request_error, AuthFlow, PendingRequest, RequestOptions,
};
use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Client for the backend REST API.
///
/// Every request carries the stored access token. A 401 on a session request
/// triggers one refresh shared by all concurrent callers, then a single retry.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: TokenStore,
    login_path: String,
    default_timeout: Duration,
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: TokenStore, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            store,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            default_timeout: timeout,
            refresh_gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn from_config(config: &Config, store: TokenStore) -> Result<Self> {
        Ok(Self::new(
            config.api.base_url.clone(),
            store,
            Duration::from_secs(config.api.timeout_secs),
        )?
        .with_login_path(config.guard.login_path.clone()))
    }

    /// Where hosts are told to navigate on forced logout
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::GET, endpoint, RequestOptions::new())
            .await
    }

    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, endpoint, RequestOptions::new().json(body)?)
            .await
    }

    pub async fn put<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, endpoint, RequestOptions::new().json(body)?)
            .await
    }

    pub async fn patch<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, endpoint, RequestOptions::new().json(body)?)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::DELETE, endpoint, RequestOptions::new())
            .await
    }

    /// Dispatch one logical call and decode its JSON body.
    ///
    /// An empty success body decodes as JSON `null`, so `()`, `Option<_>` and
    /// `serde_json::Value` all accept it.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let mut pending = PendingRequest::new(method, build_url(&self.base_url, endpoint), &options);
        let timeout = options.timeout.unwrap_or(self.default_timeout);

        let sent_with = self.store.access_token();
        let received = self.dispatch(&pending, sent_with.as_deref(), timeout).await?;

        match options.flow {
            AuthFlow::Credentials if is_credential_rejection(received.status) => {
                return Err(Error::InvalidCredentials(received.message()));
            }
            AuthFlow::Session if received.status == StatusCode::UNAUTHORIZED => {}
            _ => return received.decode(),
        }

        // First 401 for this call: refresh (shared) and retry exactly once
        debug!(request_id = %pending.id, "Access token rejected, refreshing");
        let token = match self.refresh_after(sent_with.as_deref()).await {
            Ok(token) => token,
            Err(err) => {
                warn!(request_id = %pending.id, "Token refresh failed: {}", err);
                return Err(Error::Unauthorized);
            }
        };

        pending.retried = true;
        let received = self.dispatch(&pending, Some(&token), timeout).await?;
        if received.status == StatusCode::UNAUTHORIZED {
            warn!(request_id = %pending.id, "Retried request still unauthorized");
            self.force_logout();
            return Err(Error::Unauthorized);
        }

        received.decode()
    }

    /// Dispatch once without a bearer token or refresh handling.
    ///
    /// Used by the refresh exchange, which must not present the rejected token.
    pub(crate) async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let pending = PendingRequest::new(method, build_url(&self.base_url, endpoint), &options);
        let timeout = options.timeout.unwrap_or(self.default_timeout);

        self.dispatch(&pending, None, timeout).await?.decode()
    }

    /// Refresh the access token, joining any refresh already in flight
    pub async fn refresh_session(&self) -> Result<String> {
        let current = self.store.access_token();
        self.refresh_after(current.as_deref()).await
    }

    /// Single-flight refresh.
    ///
    /// `stale` is the token the caller was rejected with. If the stored token
    /// changed while waiting for the gate, another caller already refreshed and
    /// the new token is reused. Any failure clears the session.
    async fn refresh_after(&self, stale: Option<&str>) -> Result<String> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.store.access_token() {
            if stale != Some(current.as_str()) {
                debug!("Reusing token refreshed by a concurrent request");
                return Ok(current);
            }
        }

        match crate::auth::service::exchange_refresh_token(self).await {
            Ok(token) => {
                info!("Access token refreshed");
                Ok(token)
            }
            Err(err) => {
                self.force_logout();
                Err(err)
            }
        }
    }

    /// Clear the session and tell listeners to navigate to login
    fn force_logout(&self) {
        warn!("Session expired, redirecting to {}", self.login_path);
        if let Err(e) = self.store.expire(&self.login_path) {
            warn!("Failed to persist cleared session: {}", e);
        }
    }

    /// Send and read the whole body; `timeout` covers both
    async fn dispatch(
        &self,
        pending: &PendingRequest,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Received> {
        debug!(
            request_id = %pending.id,
            method = %pending.method,
            url = %pending.url,
            retry = pending.retried,
            authenticated = token.is_some(),
            "Dispatching request"
        );

        let mut builder = self
            .http
            .request(pending.method.clone(), &pending.url)
            .header("X-Request-Id", pending.id.to_string());

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &pending.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &pending.body {
            builder = builder.json(body);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(Received {
                status,
                body: body.to_vec(),
            })
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result.map_err(|e| map_request_error(e, timeout)),
            Err(_) => Err(Error::Timeout(timeout)),
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("login_path", &self.login_path)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

fn is_credential_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}

/// Status and body of one completed dispatch
struct Received {
    status: StatusCode,
    body: Vec<u8>,
}

impl Received {
    fn message(&self) -> String {
        error_message(self.status.as_u16(), &String::from_utf8_lossy(&self.body))
    }

    /// Decode a success body or surface the backend's error
    fn decode<T: DeserializeOwned>(self) -> Result<T> {
        if !self.status.is_success() {
            return Err(Error::Server {
                status: self.status.as_u16(),
                message: self.message(),
            });
        }

        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_slice(b"null")?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}
