//! Application layer services implementing business logic.
//!
//! Services consume the repository and checker ports of [`crate::domain`]
//! and provide the operations used by the HTTP handlers and workers.
//!
//! # Available Services
//!
//! - [`services::short_url_service::ShortUrlService`] - Creation, lookup, deletion and revalidation
//! - [`services::validation_service::ValidationService`] - Validation fan-out and result recording
//! - [`services::redirect_service::RedirectService`] - Redirect decisions
//! - [`services::bulk_import_service::BulkImportService`] - CSV bulk import and reports
//! - [`services::click_service::ClickService`] - Click event hand-off
//! - [`services::auth_service::AuthService`] - Admin token authentication

pub mod services;
