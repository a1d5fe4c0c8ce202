//! Threat-intelligence lookup port.

use async_trait::async_trait;

/// Classification returned by a threat lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyVerdict {
    Safe,
    Unsafe,
}

impl SafetyVerdict {
    pub fn is_safe(self) -> bool {
        self == SafetyVerdict::Safe
    }
}

/// Failure to obtain a verdict from a remote checker.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Looks a URL up in a reputation service.
///
/// Errors are returned rather than mapped to a verdict; the caller decides
/// how to record them and must never treat an error as [`SafetyVerdict::Safe`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SafetyChecker: Send + Sync {
    /// # Errors
    ///
    /// Returns [`CheckError`] if the service could not be reached or its
    /// response could not be understood.
    async fn check(&self, url: &str) -> Result<SafetyVerdict, CheckError>;
}
