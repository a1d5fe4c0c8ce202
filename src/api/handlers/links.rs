//! Handlers for short URL creation, lookup and administration.

use axum::{
    Form, Json,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::net::SocketAddr;
use validator::Validate;

use crate::api::dto::link::{
    CreateLinkForm, CreateLinkResponse, LinkInfoResponse, LinkStateResponse,
};
use crate::application::services::CreateShortUrl;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Creates a short URL.
///
/// # Endpoint
///
/// `POST /api/link` (form: `url`, optional `sponsor`)
///
/// # Response
///
/// `201 Created` with `Location` set to the short URL:
///
/// ```json
/// {
///   "url": "http://localhost:3000/a1B2c3D4e5F6",
///   "properties": { "safe": true, "validation": "PENDING" }
/// }
/// ```
///
/// Validation runs after the response is sent; its result is visible on
/// the next redirect or lookup.
///
/// # Errors
///
/// Returns 400 Bad Request if the URL is not an absolute http(s) URL.
pub async fn create_link_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Form(form): Form<CreateLinkForm>,
) -> Result<Response, AppError> {
    form.validate()?;

    let ip = client_ip(&headers, addr, state.behind_proxy);
    let record = state
        .short_url_service
        .create(CreateShortUrl {
            url: form.url,
            sponsor: form.sponsor,
            ip: Some(ip.to_string()),
        })
        .await?;

    let short_url = state.short_url_service.short_url(&record.hash);
    let location = HeaderValue::try_from(short_url.as_str()).map_err(|_| {
        AppError::internal("Short URL is not a valid header value", json!({}))
    })?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CreateLinkResponse::new(short_url, &record)),
    )
        .into_response())
}

/// Returns the validation state and click history of a short URL.
///
/// # Endpoint
///
/// `GET /api/link/{hash}`
///
/// # Errors
///
/// Returns 404 Not Found if the hash doesn't exist.
pub async fn link_info_handler(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<LinkInfoResponse>, AppError> {
    let info = state.short_url_service.info(&hash).await?;
    let url = state.short_url_service.short_url(&hash);

    Ok(Json(LinkInfoResponse::new(url, info)))
}

/// Deletes a short URL and its clicks.
///
/// # Endpoint
///
/// `DELETE /api/link/{hash}` (admin)
///
/// # Errors
///
/// Returns 404 Not Found if the hash doesn't exist.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<StatusCode, AppError> {
    state.short_url_service.delete(&hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resets the validation state and runs every check again.
///
/// # Endpoint
///
/// `POST /api/link/{hash}/revalidate` (admin)
///
/// Waits for the checks and returns the new state.
///
/// # Errors
///
/// Returns 404 Not Found if the hash doesn't exist.
pub async fn revalidate_link_handler(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<LinkStateResponse>, AppError> {
    let record = state.short_url_service.revalidate(&hash).await?;
    let url = state.short_url_service.short_url(&hash);

    Ok(Json(LinkStateResponse::new(url, record)))
}
