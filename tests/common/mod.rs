//! Mock backend for client and auth service tests

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use rentgate::auth::TokenStore;
use rentgate::client::ApiClient;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const GOOD_PASSWORD: &str = "correct-horse";

#[derive(Default)]
pub struct MockState {
    /// Access token the backend currently accepts
    pub valid_access: Mutex<String>,
    /// Refresh token the backend currently accepts
    pub valid_refresh: Mutex<String>,
    pub refresh_calls: AtomicUsize,
    pub refresh_fails: AtomicBool,
    pub rotate_refresh: AtomicBool,
    pub refresh_delay_ms: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub logout_fails: AtomicBool,
    pub me_fails: AtomicBool,
    /// `Authorization` header of every /properties call
    pub seen_auth: Mutex<Vec<Option<String>>>,
    /// `Authorization` header of every refresh call
    pub refresh_auth: Mutex<Vec<Option<String>>>,
    pub slow_retry_calls: AtomicUsize,
}

impl MockState {
    pub fn accept(&self, access: &str, refresh: &str) {
        *self.valid_access.lock() = access.to_string();
        *self.valid_refresh.lock() = refresh.to_string();
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.valid_access.lock());
        bearer(headers).is_some_and(|value| value == expected)
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        state.accept("A1", "R1");

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/token/refresh", post(refresh))
            .route("/auth/logout", post(logout))
            .route("/auth/me", get(me))
            .route("/properties", get(properties))
            .route("/always-401", get(always_unauthorized))
            .route("/broken", get(broken))
            .route("/bad-gateway", get(bad_gateway))
            .route("/slow", get(slow))
            .route("/stalled-body", get(stalled_body))
            .route("/slow-after-refresh", get(slow_after_refresh))
            .route("/empty", post(empty))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    /// Client over a fresh in-memory store
    pub fn client(&self) -> ApiClient {
        self.client_with(TokenStore::in_memory())
    }

    pub fn client_with(&self, store: TokenStore) -> ApiClient {
        ApiClient::new(self.base_url.clone(), store, Duration::from_secs(5))
            .expect("build client")
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Base URL of a port nothing listens on
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn user_json(email: &str, user_type: &str) -> Value {
    json!({
        "id": 7,
        "email": email,
        "first_name": "Ada",
        "last_name": "Okafor",
        "user_type": user_type,
    })
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] != GOOD_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        );
    }

    state.accept("A1", "R1");
    let email = body["email"].as_str().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "user": user_json(email, "landlord"),
            "tokens": {"access": "A1", "refresh": "R1"},
        })),
    )
}

async fn register(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let email = body["email"].as_str().unwrap_or_default();
    if email.contains("taken") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "An account with this email already exists"})),
        );
    }

    state.accept("A1", "R1");
    let user_type = body["user_type"].as_str().unwrap_or("landlord");
    (
        StatusCode::CREATED,
        Json(json!({
            "user": user_json(email, user_type),
            "tokens": {"access": "A1", "refresh": "R1"},
        })),
    )
}

async fn refresh(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.refresh_auth.lock().push(bearer(&headers));
    let call = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay as u64)).await;
    }

    let expected = state.valid_refresh.lock().clone();
    if state.refresh_fails.load(Ordering::SeqCst) || body["refresh"] != expected.as_str() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Token is invalid or expired"})),
        );
    }

    let access = format!("T{}", call + 1);
    if state.rotate_refresh.load(Ordering::SeqCst) {
        let refresh = format!("R{}", call + 1);
        state.accept(&access, &refresh);
        (StatusCode::OK, Json(json!({"access": access, "refresh": refresh})))
    } else {
        *state.valid_access.lock() = access.clone();
        (StatusCode::OK, Json(json!({"access": access})))
    }
}

async fn logout(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    if state.logout_fails.load(Ordering::SeqCst) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> impl IntoResponse {
    if state.me_fails.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "boom"})));
    }
    if !state.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"})));
    }
    (StatusCode::OK, Json(user_json("ada@rent.io", "tenant")))
}

async fn properties(State(state): State<Arc<MockState>>, headers: HeaderMap) -> impl IntoResponse {
    state.seen_auth.lock().push(bearer(&headers));
    if !state.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token expired"})));
    }
    (
        StatusCode::OK,
        Json(json!({"items": [{"id": 1, "name": "Harbour View"}]})),
    )
}

async fn always_unauthorized() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Forbidden resource"})))
}

async fn broken() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": "Database unavailable"})),
    )
}

async fn bad_gateway() -> impl IntoResponse {
    StatusCode::BAD_GATEWAY
}

async fn slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({"ok": true}))
}

/// Headers and the first chunk arrive at once; the rest of the body stalls
async fn stalled_body() -> impl IntoResponse {
    let chunks = futures_util::stream::unfold(0u8, |step| async move {
        match step {
            0 => Some((Ok::<_, std::io::Error>(Bytes::from_static(b"{\"ok\":")), 1)),
            1 => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Some((Ok(Bytes::from_static(b"true}")), 2))
            }
            _ => None,
        }
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(chunks),
    )
}

/// Rejects stale tokens at once but is slow for a valid one
async fn slow_after_refresh(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.slow_retry_calls.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token expired"})));
    }
    tokio::time::sleep(Duration::from_secs(3)).await;
    (StatusCode::OK, Json(json!({"ok": true})))
}

async fn empty() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
