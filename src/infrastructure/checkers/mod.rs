//! Checker adapters.
//!
//! - [`block_list`] - File-backed and static deny lists
//! - [`reachability`] - `reqwest` probe
//! - [`safe_browsing`] - Threat lookup client and a disabled stand-in

pub mod block_list;
pub mod reachability;
pub mod safe_browsing;

pub use block_list::{FileBlockListProvider, StaticBlockListProvider};
pub use reachability::HttpReachabilityChecker;
pub use safe_browsing::{DisabledSafetyChecker, SafeBrowsingChecker, SafeBrowsingConfig};
