//! Repository trait for short URL records and their validation state.

use crate::domain::entities::{BlockState, ReachableState, RedirectMode, ShortUrl};
use crate::error::AppError;
use async_trait::async_trait;

/// Persistence port for [`ShortUrl`] records.
///
/// Checkers run concurrently and never coordinate with each other, so every
/// `update_*` method must be a single atomic, field-scoped, conditional
/// write that follows the merge policy in
/// [`crate::domain::entities::validation`]:
///
/// - the new value is stored only if its rank (or severity) is strictly
///   higher than the stored one,
/// - applying the same update twice leaves the record unchanged.
///
/// Each update returns `Ok(true)` when the stored value changed and
/// `Ok(false)` when the update was a no-op (unknown hash, equal or lower
/// rank).
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgShortUrlRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::MemoryShortUrlRepository`] - in-process map
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortUrlRepository: Send + Sync {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the hash is already taken.
    async fn save(&self, short_url: ShortUrl) -> Result<ShortUrl, AppError>;

    /// Finds a record by its hash.
    async fn find_by_hash(&self, hash: &str) -> Result<Option<ShortUrl>, AppError>;

    /// Merges a block-list result into `block_state`.
    async fn update_block_state(&self, hash: &str, state: BlockState) -> Result<bool, AppError>;

    /// Merges a reachability result into `reachable_state`.
    async fn update_reachable_state(
        &self,
        hash: &str,
        state: ReachableState,
    ) -> Result<bool, AppError>;

    /// Merges a threat-lookup result. `false` always wins over `true`.
    async fn update_safe(&self, hash: &str, safe: bool) -> Result<bool, AppError>;

    /// Raises `redirect_mode` if `mode` is more severe than the stored one.
    async fn update_redirect_mode(&self, hash: &str, mode: RedirectMode)
    -> Result<bool, AppError>;

    /// Resets every validation field to its initial value.
    ///
    /// This is the only operation allowed to clear a recorded failure and is
    /// reserved for administrative re-validation.
    async fn reset_validation(&self, hash: &str) -> Result<bool, AppError>;

    /// Deletes a record. Returns `Ok(false)` if it did not exist.
    async fn delete_by_hash(&self, hash: &str) -> Result<bool, AppError>;

    /// Checks that the backing store is reachable.
    async fn health_check(&self) -> bool;
}
