//! API route configuration.
//!
//! Creation, lookup and bulk import are public. Deleting and revalidating a
//! short URL require the admin Bearer token via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    bulk_import_handler, create_link_handler, delete_link_handler, link_info_handler,
    revalidate_link_handler,
};
use crate::api::middleware::auth;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{delete, post},
};

/// All API routes.
///
/// # Endpoints
///
/// - `POST   /link`                   - Create a short URL
/// - `GET    /link/{hash}`            - Validation state and clicks
/// - `DELETE /link/{hash}`            - Delete a short URL (admin)
/// - `POST   /link/{hash}/revalidate` - Reset and rerun validation (admin)
/// - `POST   /bulk`                   - CSV bulk import
pub fn api_routes(state: AppState) -> Router<AppState> {
    let admin = middleware::from_fn_with_state(state, auth::layer);

    Router::new()
        .route("/link", post(create_link_handler))
        .route(
            "/link/{hash}",
            delete(delete_link_handler)
                .route_layer(admin.clone())
                .get(link_info_handler),
        )
        .route(
            "/link/{hash}/revalidate",
            post(revalidate_link_handler).route_layer(admin),
        )
        .route("/bulk", post(bulk_import_handler))
}
