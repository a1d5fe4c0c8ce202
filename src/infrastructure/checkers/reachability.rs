//! HTTP reachability probe.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::checkers::{ReachabilityChecker, ReachabilityVerdict};

/// Probes a destination with a single `GET`.
#[derive(Debug, Clone)]
pub struct HttpReachabilityChecker {
    client: Client,
}

impl HttpReachabilityChecker {
    /// Builds a checker whose probes give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReachabilityChecker for HttpReachabilityChecker {
    async fn check(&self, url: &str) -> ReachabilityVerdict {
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => ReachabilityVerdict::Reachable,
            Ok(response) => {
                tracing::debug!(url, status = response.status().as_u16(), "Probe returned non-success status");
                ReachabilityVerdict::NotReachable
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "Probe failed");
                ReachabilityVerdict::NotReachable
            }
        }
    }
}
