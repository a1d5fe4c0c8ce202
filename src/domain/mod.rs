//! Domain layer containing business entities and ports.
//!
//! This module implements the core domain logic following Clean Architecture principles.
//! It defines entities, repository and checker interfaces, and message contracts
//! independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Short URLs, clicks and validation state
//! - [`repositories`] - Data access trait definitions
//! - [`checkers`] - Block-list, reachability and safety checks
//! - [`reachability_queue`] - Queue message contract for reachability jobs
//! - [`click_event`] - Click tracking event model
//! - [`click_worker`] - Asynchronous click processing worker
//!
//! # Click Processing Flow
//!
//! 1. HTTP handler serves a redirect
//! 2. [`click_event::ClickEvent`] is sent to a bounded channel
//! 3. [`click_worker::run_click_worker`] saves it with retry logic
//! 4. A detached follow-up fills in browser and platform

pub mod checkers;
pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod reachability_queue;
pub mod repositories;
