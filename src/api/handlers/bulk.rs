//! Handler for CSV bulk import.

use axum::{
    extract::{ConnectInfo, Multipart, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::net::SocketAddr;

use crate::application::services::bulk_import_service::report_file_name;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

const FILE_FIELD: &str = "file";

/// Shortens every URL of an uploaded CSV file and returns a report.
///
/// # Endpoint
///
/// `POST /api/bulk` (multipart, field `file`)
///
/// Each URL is created and validated before the next one. The report has
/// one `original;short;outcome` line per input line:
///
/// ```text
/// https://a.example/;http://localhost:3000/a1B2c3D4e5F6;OK
/// not-a-url;Format Invalid;ERROR: debe ser una URI http o https
/// ```
///
/// # Response
///
/// `201 Created`, `Content-Type: text/csv`, served as the attachment
/// `<name>_check.csv`.
///
/// # Errors
///
/// Returns 400 Bad Request if the `file` field is missing or its name does
/// not end in `.csv`.
pub async fn bulk_import_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        AppError::bad_request("Malformed multipart body", json!({ "reason": e.body_text() }))
    };

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        // Rejected before the body is read.
        report_file_name(&file_name)?;

        let bytes = field.bytes().await.map_err(malformed)?;
        let content = String::from_utf8_lossy(&bytes);
        let ip = client_ip(&headers, addr, state.behind_proxy);

        let report = state
            .bulk_import_service
            .import(&file_name, &content, Some(ip.to_string()))
            .await?;

        let disposition =
            HeaderValue::try_from(format!("attachment; filename=\"{}\"", report.file_name))
                .map_err(|_| {
                    AppError::bad_request(
                        "File name is not a valid header value",
                        json!({ "file": file_name }),
                    )
                })?;

        return Ok((
            StatusCode::CREATED,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            report.body,
        )
            .into_response());
    }

    Err(AppError::bad_request(
        "Missing file",
        json!({ "field": FILE_FIELD }),
    ))
}
