//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{hash}`      - Short URL redirect (public)
//! - `GET  /health`      - Health check: DB, click queue, reachability queue (public)
//! - `/api/*`            - REST API (admin operations require a Bearer token)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Authentication** - Bearer token on admin operations
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let api_router =
        api::routes::api_routes(state.clone()).layer(rate_limit::secure_layer(behind_proxy));

    let public_router = Router::new()
        .route("/{hash}", get(redirect_handler))
        .route("/health", get(health_handler))
        .layer(rate_limit::layer(behind_proxy));

    let router = Router::new()
        .merge(public_router)
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
