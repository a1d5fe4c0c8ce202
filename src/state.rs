//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::{
    AuthService, BulkImportService, ClickService, RedirectService, ShortUrlService,
    ValidationService,
};
use crate::domain::repositories::ShortUrlRepository;

#[derive(Clone)]
pub struct AppState {
    pub short_url_service: Arc<ShortUrlService>,
    pub redirect_service: Arc<RedirectService>,
    pub bulk_import_service: Arc<BulkImportService>,
    pub validation_service: Arc<ValidationService>,
    pub auth_service: Arc<AuthService>,
    pub click_service: ClickService,
    /// Used by the health check.
    pub short_url_repository: Arc<dyn ShortUrlRepository>,
    /// Read client IPs from proxy headers.
    pub behind_proxy: bool,
}
