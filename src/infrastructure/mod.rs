//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for persistence, checks and message transport.
//!
//! # Modules
//!
//! - [`checkers`] - Block lists, reachability probe, threat lookup
//! - [`persistence`] - PostgreSQL and in-memory repositories
//! - [`queue`] - Reachability queue transports (channel and Redis)
//! - [`reports`] - Bulk-import report files

pub mod checkers;
pub mod persistence;
pub mod queue;
pub mod reports;
