//! Repository trait definitions for the domain layer.
//!
//! Traits define the persistence contract; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`ShortUrlRepository`] - Short URL records and merge-aware validation updates
//! - [`ClickRepository`] - Click records and user-agent follow-up updates

pub mod click_repository;
pub mod short_url_repository;

pub use click_repository::ClickRepository;
pub use short_url_repository::ShortUrlRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use short_url_repository::MockShortUrlRepository;
