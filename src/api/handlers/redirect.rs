//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::net::SocketAddr;

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Redirects a short URL to its destination.
///
/// # Endpoint
///
/// `GET /{hash}`
///
/// # Request Flow
///
/// 1. Read the stored validation state of the hash
/// 2. On a redirect mode, send a click event to the background worker
/// 3. Answer with the stored redirect status and `Location`
///
/// The answer reflects the checks recorded so far: a request that arrives
/// before validation finishes is redirected.
///
/// # Click Tracking
///
/// Click events are sent to a bounded channel for async processing.
/// If the queue is full, the click is dropped.
///
/// # Errors
///
/// - 404 Not Found if the hash doesn't exist
/// - 403 Forbidden if the destination or creator is blocked, or the
///   destination is unsafe
/// - 400 Bad Request if the destination is unreachable
pub async fn redirect_handler(
    Path(hash): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError> {
    let decision = state.redirect_service.decide(&hash).await?;

    if let Some(rejection) = decision.rejection(&hash) {
        return Err(rejection);
    }

    let status = StatusCode::from_u16(decision.mode.code())
        .unwrap_or(StatusCode::TEMPORARY_REDIRECT);
    let location = HeaderValue::try_from(decision.target.as_str()).map_err(|_| {
        AppError::internal(
            "Stored target is not a valid header value",
            json!({ "hash": hash }),
        )
    })?;

    let ip = client_ip(&headers, addr, state.behind_proxy);
    state.click_service.track(ClickEvent::new(
        hash,
        Some(ip.to_string()),
        headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()),
        headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
    ));

    Ok((status, [(header::LOCATION, location)]).into_response())
}
