//! Auth service: login, registration, refresh, logout and profile lookup

use crate::auth::models::{
    AuthResponse, Credentials, RefreshRequest, RefreshResponse, Registration, User,
};
use crate::auth::TokenStore;
use crate::client::{ApiClient, AuthFlow, RequestOptions};
use crate::error::{Error, Result};
use reqwest::Method;
use tracing::{info, warn};

pub const LOGIN_ENDPOINT: &str = "/auth/login";
pub const REGISTER_ENDPOINT: &str = "/auth/register";
pub const REFRESH_ENDPOINT: &str = "/auth/token/refresh";
pub const LOGOUT_ENDPOINT: &str = "/auth/logout";
pub const ME_ENDPOINT: &str = "/auth/me";

/// Thin façade over [`ApiClient`] that keeps the token store in sync
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &TokenStore {
        self.client.store()
    }

    /// Sign in and store the returned session
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        let response: AuthResponse = self
            .client
            .request(
                Method::POST,
                LOGIN_ENDPOINT,
                RequestOptions::new().json(credentials)?.credentials(),
            )
            .await?;

        self.accept(response)
    }

    /// Create an account; the backend signs the new user in
    pub async fn register(&self, registration: &Registration) -> Result<User> {
        let response: AuthResponse = self
            .client
            .request(
                Method::POST,
                REGISTER_ENDPOINT,
                RequestOptions::new().json(registration)?.credentials(),
            )
            .await?;

        self.accept(response)
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Shares the client's single-flight gate; on failure the session is cleared.
    pub async fn refresh(&self) -> Result<String> {
        self.client.refresh_session().await
    }

    /// Best-effort backend logout; the local session is always cleared
    pub async fn logout(&self) -> Result<()> {
        let store = self.store();

        if let Some(refresh) = store.refresh_token() {
            let result: Result<serde_json::Value> = self
                .client
                .request(
                    Method::POST,
                    LOGOUT_ENDPOINT,
                    RequestOptions::new()
                        .json(&RefreshRequest { refresh: &refresh })?
                        .flow(AuthFlow::Bare),
                )
                .await;

            if let Err(e) = result {
                warn!("Backend logout failed, clearing local session anyway: {}", e);
            }
        }

        store.clear_tokens()?;
        info!("Signed out");
        Ok(())
    }

    /// Current profile, or `None` on any failure
    pub async fn current_user(&self) -> Option<User> {
        match self.client.get::<User>(ME_ENDPOINT).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!("No current user: {}", e);
                None
            }
        }
    }

    fn accept(&self, response: AuthResponse) -> Result<User> {
        self.store().set_session(
            &response.tokens.access,
            &response.tokens.refresh,
            response.user.user_type,
        )?;

        info!(user_type = %response.user.user_type, "Signed in");
        Ok(response.user)
    }
}

/// Raw refresh exchange used by the client's refresh gate.
///
/// Sent with [`ApiClient::send_once`]: no bearer token, and a rejected refresh
/// never refreshes again.
pub(crate) async fn exchange_refresh_token(client: &ApiClient) -> Result<String> {
    let store = client.store();
    let refresh = store.refresh_token().ok_or(Error::Unauthorized)?;

    let response: RefreshResponse = client
        .send_once(
            Method::POST,
            REFRESH_ENDPOINT,
            RequestOptions::new().json(&RefreshRequest { refresh: &refresh })?,
        )
        .await?;

    if response.access.is_empty() {
        return Err(Error::Unauthorized);
    }

    store.set_tokens(&response.access, response.refresh.as_deref())?;
    store.notify_refreshed();
    Ok(response.access)
}
