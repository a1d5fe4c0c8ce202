//! Core domain entities.
//!
//! - [`ShortUrl`] - A hash mapped to a destination URL and its validation state
//! - [`Click`] - A redirect event on a short URL
//! - [`validation`] - Validation state enums and the severity-merge policy

pub mod click;
pub mod short_url;
pub mod validation;

pub use click::{Click, ClickProperties, NewClick};
pub use short_url::{ShortUrl, ShortUrlProperties};
pub use validation::{BlockState, ReachableState, RedirectMode, SafetyState, ValidationOutcome};
