//! Business logic services for the application layer.

pub mod auth_service;
pub mod bulk_import_service;
pub mod click_service;
pub mod redirect_service;
pub mod short_url_service;
pub mod validation_service;

pub use auth_service::AuthService;
pub use bulk_import_service::{BulkImportReport, BulkImportService, ReportEntry};
pub use click_service::ClickService;
pub use redirect_service::{RedirectDecision, RedirectService};
pub use short_url_service::{CreateShortUrl, ShortUrlInfo, ShortUrlService};
pub use validation_service::{
    CheckKind, CheckOutcome, CheckReport, ValidationHandle, ValidationRequest, ValidationService,
};
