//! Repository implementations.
//!
//! # Repositories
//!
//! - [`PgShortUrlRepository`] - Short URL storage with conditional validation updates
//! - [`PgClickRepository`] - Click storage
//! - [`MemoryShortUrlRepository`], [`MemoryClickRepository`] - In-process equivalents

pub mod memory;
pub mod pg_click_repository;
pub mod pg_short_url_repository;

pub use memory::{MemoryClickRepository, MemoryShortUrlRepository};
pub use pg_click_repository::PgClickRepository;
pub use pg_short_url_repository::PgShortUrlRepository;
