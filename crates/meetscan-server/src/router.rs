//! Axum router construction.

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all API routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_handler))
        .route(
            "/api/email/fetch",
            get(handlers::fetch_handler).post(handlers::fetch_handler),
        )
        .route("/api/email/list", get(handlers::list_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
