//! Edge server handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::server::SharedTable;
use crate::auth::{Session, UserRole};
use crate::guard::{
    append_set_cookies, clear_session_cookies, session_cookies, LandingPage, RouteRule,
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Public view of the guard configuration
#[derive(Debug, Serialize)]
pub struct RouteTableView {
    pub login_path: String,
    pub public_paths: Vec<String>,
    pub rules: Vec<RouteRule>,
    pub landing_pages: Vec<LandingPage>,
}

pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok("healthy"))
}

/// Route rules, so dashboards can hide links the guard would refuse
pub async fn route_table(State(table): State<SharedTable>) -> impl IntoResponse {
    Json(ApiResponse::ok(RouteTableView {
        login_path: table.login_path.clone(),
        public_paths: table.public_paths.clone(),
        rules: table.rules.clone(),
        landing_pages: table.landing_pages.clone(),
    }))
}

/// Body of `POST /api/session`, sent by the dashboard after sign-in or refresh
#[derive(Debug, Deserialize)]
pub struct SessionCookiesRequest {
    pub access: String,
    pub user_type: UserRole,
}

/// Mirror the stored session into the cookies the route guard reads
pub async fn set_session_cookies(Json(body): Json<SessionCookiesRequest>) -> Response {
    if body.access.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error("access token is required")),
        )
            .into_response();
    }

    let session = Session {
        access_token: Some(body.access),
        refresh_token: None,
        user_type: Some(body.user_type),
    };

    let mut response = StatusCode::NO_CONTENT.into_response();
    append_set_cookies(response.headers_mut(), session_cookies(&session));
    response
}

/// Expire the session cookies after sign-out
pub async fn clear_session() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    append_set_cookies(response.headers_mut(), clear_session_cookies());
    response
}
