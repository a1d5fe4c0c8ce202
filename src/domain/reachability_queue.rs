//! Message contract for queue-dispatched reachability checks.
//!
//! When reachability is dispatched through a queue, creation publishes one
//! text message per short URL in the form `"<hash>|<url>"`. The consumer
//! probes the URL and applies the same repository updates as the inline
//! check. Updates are idempotent, so duplicate delivery is harmless.

use async_trait::async_trait;

const SEPARATOR: char = '|';

/// A reachability job: probe `url` and record the result on `hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityMessage {
    pub hash: String,
    pub url: String,
}

impl ReachabilityMessage {
    pub fn new(hash: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            url: url.into(),
        }
    }

    /// Wire form of the message.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.hash, SEPARATOR, self.url)
    }

    /// Parses the wire form.
    ///
    /// The message is split at the first `|`, so the URL itself may contain
    /// further separators. Returns `None` if either side is empty.
    pub fn decode(raw: &str) -> Option<Self> {
        let (hash, url) = raw.split_once(SEPARATOR)?;
        let hash = hash.trim();
        let url = url.trim();

        if hash.is_empty() || url.is_empty() {
            return None;
        }

        Some(Self::new(hash, url))
    }
}

/// Errors raised by a queue transport.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue is full")]
    Full,

    #[error("queue is closed")]
    Closed,

    #[error("queue backend error: {0}")]
    Backend(String),
}

/// Producer side of the reachability queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReachabilityPublisher: Send + Sync {
    /// Publishes one message.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] if the message could not be enqueued.
    async fn publish(&self, message: ReachabilityMessage) -> Result<(), QueueError>;

    /// Short transport name for logs and health output.
    fn transport(&self) -> &'static str;

    /// Checks that the transport can accept messages.
    async fn health_check(&self) -> bool;
}
