//! Route guard middleware

use crate::guard::cookies::{append_set_cookies, clear_session_cookies, RouteCookies};
use crate::guard::rules::{RouteDecision, RouteTable};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Allow or redirect a navigation before any page handler runs
pub async fn route_guard(
    State(table): State<Arc<RouteTable>>,
    req: Request,
    next: Next,
) -> Response {
    let cookies = RouteCookies::from_headers(req.headers());
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path())
        .to_string();

    match table.decide(&target, &cookies) {
        RouteDecision::Allow => next.run(req).await,
        RouteDecision::Redirect(redirect) => {
            let location = redirect.location();
            tracing::debug!(uri = %target, location = %location, "Route guard redirect");

            let mut response = Redirect::temporary(&location).into_response();
            if redirect.clear_session {
                append_set_cookies(response.headers_mut(), clear_session_cookies());
            }
            response
        }
    }
}
