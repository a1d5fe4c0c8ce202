//! Utility functions for hash generation, URL processing, and request handling.
//!
//! - [`code_generator`] - Short URL hash generation
//! - [`url_normalizer`] - Destination URL checks and normalization
//! - [`client_ip`] - Client address resolution behind proxies
//! - [`user_agent`] - Browser and platform detection

pub mod client_ip;
pub mod code_generator;
pub mod url_normalizer;
pub mod user_agent;
