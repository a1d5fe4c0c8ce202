//! Repository trait for click records.

use crate::domain::entities::{Click, NewClick};
use crate::error::AppError;
use async_trait::async_trait;

/// Persistence port for [`Click`] records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::MemoryClickRepository`] - in-process list
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Records a new click.
    async fn save(&self, new_click: NewClick) -> Result<Click, AppError>;

    /// Returns every click recorded for a hash, oldest first.
    async fn find_all_by_hash(&self, hash: &str) -> Result<Vec<Click>, AppError>;

    /// Sets `browser` on the clicks of `hash` that do not have one yet.
    ///
    /// Returns the number of clicks updated.
    async fn update_browser(&self, hash: &str, browser: &str) -> Result<u64, AppError>;

    /// Sets `platform` on the clicks of `hash` that do not have one yet.
    ///
    /// Returns the number of clicks updated.
    async fn update_platform(&self, hash: &str, platform: &str) -> Result<u64, AppError>;
}
