//! Block-list membership check for destination URLs and submitter IPs.
//!
//! Lists come from a [`BlockListProvider`], which hands out a fresh
//! snapshot on every call. The production provider re-reads its file each
//! time; lists are small and only consulted once per short URL, so there is
//! no caching layer.

use std::sync::Arc;

use async_trait::async_trait;
use strum::{AsRefStr, Display, EnumString};

/// Which deny list a subject is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ListKind {
    /// Entries are substrings; a URL containing any entry is blocked.
    Url,
    /// Entries are exact IP strings.
    Ip,
}

/// Errors raised while loading a deny list.
#[derive(Debug, thiserror::Error)]
pub enum BlockListError {
    #[error("failed to read {kind} block list from {path}: {source}")]
    Io {
        kind: ListKind,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only source of deny-list entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlockListProvider: Send + Sync {
    /// Returns the current entries of the given list, one per element.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError`] if the list cannot be loaded.
    async fn entries(&self, kind: ListKind) -> Result<Vec<String>, BlockListError>;
}

/// Result of a block-list check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockVerdict {
    Ok,
    Blocked,
}

impl BlockVerdict {
    pub fn is_blocked(self) -> bool {
        self == BlockVerdict::Blocked
    }
}

/// Checks subjects against the lists of a [`BlockListProvider`].
#[derive(Clone)]
pub struct BlockListChecker {
    provider: Arc<dyn BlockListProvider>,
}

impl BlockListChecker {
    pub fn new(provider: Arc<dyn BlockListProvider>) -> Self {
        Self { provider }
    }

    /// Checks `subject` against the list of the given kind.
    ///
    /// Fails closed: if the list cannot be loaded the subject is reported
    /// as [`BlockVerdict::Blocked`].
    pub async fn check(&self, subject: &str, kind: ListKind) -> BlockVerdict {
        match self.provider.entries(kind).await {
            Ok(entries) => {
                if matches(subject, kind, &entries) {
                    BlockVerdict::Blocked
                } else {
                    BlockVerdict::Ok
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, subject, "Block list unavailable, treating subject as blocked");
                BlockVerdict::Blocked
            }
        }
    }
}

/// Applies the matching rule of `kind` to a list snapshot.
///
/// Blank entries and `#` comments never match.
fn matches(subject: &str, kind: ListKind, entries: &[String]) -> bool {
    entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty() && !entry.starts_with('#'))
        .any(|entry| match kind {
            ListKind::Url => subject.contains(entry),
            ListKind::Ip => subject.trim() == entry,
        })
}
