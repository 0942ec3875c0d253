//! Edge server: serves the dashboard pages behind the route guard

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::guard::{route_guard, RouteTable};

use super::routes;

/// Run the edge server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let app = create_router(&config);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router; every page request passes the route guard first
pub fn create_router(config: &Config) -> Router {
    let table = Arc::new(config.guard.clone());
    let pages_dir = &config.server.pages_dir;

    // Unknown paths get the SPA shell so client-side routing can take over
    let pages = ServeDir::new(pages_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(pages_dir.join("index.html")));

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/routes", get(routes::route_table))
        .route(
            "/api/session",
            post(routes::set_session_cookies).delete(routes::clear_session),
        )
        .fallback_service(pages)
        .layer(middleware::from_fn_with_state(table.clone(), route_guard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(table)
}

/// Shared state for handlers
pub type SharedTable = Arc<RouteTable>;
