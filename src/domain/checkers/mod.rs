//! Checker ports used by the validation pipeline.
//!
//! - [`block_list`] - URL and IP deny lists (fail-closed)
//! - [`reachability`] - Network probe of the destination
//! - [`safety`] - Threat-intelligence lookup of the destination
//!
//! Adapters live in `crate::infrastructure::checkers`.

pub mod block_list;
pub mod reachability;
pub mod safety;

pub use block_list::{BlockListChecker, BlockListError, BlockListProvider, BlockVerdict, ListKind};
pub use reachability::{ReachabilityChecker, ReachabilityVerdict};
pub use safety::{CheckError, SafetyChecker, SafetyVerdict};

#[cfg(test)]
pub use block_list::MockBlockListProvider;
#[cfg(test)]
pub use reachability::MockReachabilityChecker;
#[cfg(test)]
pub use safety::MockSafetyChecker;
