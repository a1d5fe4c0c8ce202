//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` through the short URL repository
/// 2. **Click Queue**: Checks if channel is open and reports capacity
/// 3. **Reachability Queue**: Transport in use and its health
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "click_queue": { "status": "ok", "message": "Capacity: 10000" },
///     "reachability_queue": { "status": "ok", "message": "Transport: inline" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;

    let click_check = check_click_queue(&state);

    let reachability_check = check_reachability_queue(&state).await;

    let all_healthy = db_check.is_ok() && click_check.is_ok() && reachability_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            click_queue: click_check,
            reachability_queue: reachability_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    if state.short_url_repository.health_check().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Database unavailable")
    }
}

fn check_click_queue(state: &AppState) -> CheckStatus {
    if state.click_service.is_closed() {
        CheckStatus::error("Click queue is closed")
    } else {
        CheckStatus::ok(format!("Capacity: {}", state.click_service.capacity()))
    }
}

async fn check_reachability_queue(state: &AppState) -> CheckStatus {
    let transport = state.validation_service.reachability_transport();

    if state.validation_service.reachability_queue_healthy().await {
        CheckStatus::ok(format!("Transport: {transport}"))
    } else {
        CheckStatus::error(format!("Transport {transport} unavailable"))
    }
}
