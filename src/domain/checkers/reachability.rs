//! Reachability probe port.

use async_trait::async_trait;

/// Outcome of probing a destination URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachabilityVerdict {
    Reachable,
    NotReachable,
}

impl ReachabilityVerdict {
    pub fn is_reachable(self) -> bool {
        self == ReachabilityVerdict::Reachable
    }
}

/// Issues a single probe against a destination URL.
///
/// A single probe is authoritative: implementations do not retry. Any
/// non-2xx status, transport error or malformed URL is reported as
/// [`ReachabilityVerdict::NotReachable`], so this port has no error type.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReachabilityChecker: Send + Sync {
    async fn check(&self, url: &str) -> ReachabilityVerdict;
}
