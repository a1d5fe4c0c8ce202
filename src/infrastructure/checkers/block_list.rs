//! Block-list providers.
//!
//! [`FileBlockListProvider`] reads the list file again on every call so edits
//! take effect without a restart. [`StaticBlockListProvider`] serves fixed
//! in-memory lists and is meant for tests and tooling.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::checkers::{BlockListError, BlockListProvider, ListKind};

/// Line-oriented list files, one entry per line.
#[derive(Debug, Clone)]
pub struct FileBlockListProvider {
    url_list: PathBuf,
    ip_list: PathBuf,
}

impl FileBlockListProvider {
    pub fn new(url_list: impl Into<PathBuf>, ip_list: impl Into<PathBuf>) -> Self {
        Self {
            url_list: url_list.into(),
            ip_list: ip_list.into(),
        }
    }

    fn path(&self, kind: ListKind) -> &PathBuf {
        match kind {
            ListKind::Url => &self.url_list,
            ListKind::Ip => &self.ip_list,
        }
    }
}

#[async_trait]
impl BlockListProvider for FileBlockListProvider {
    async fn entries(&self, kind: ListKind) -> Result<Vec<String>, BlockListError> {
        let path = self.path(kind);
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BlockListError::Io {
                kind,
                path: path.display().to_string(),
                source,
            })?;

        Ok(content.lines().map(str::to_string).collect())
    }
}

/// Fixed in-memory lists.
#[derive(Debug, Clone, Default)]
pub struct StaticBlockListProvider {
    lists: HashMap<ListKind, Vec<String>>,
}

impl StaticBlockListProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, S>(mut self, kind: ListKind, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists
            .entry(kind)
            .or_default()
            .extend(entries.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl BlockListProvider for StaticBlockListProvider {
    async fn entries(&self, kind: ListKind) -> Result<Vec<String>, BlockListError> {
        Ok(self.lists.get(&kind).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_provider_reads_each_list() {
        let mut urls = tempfile::NamedTempFile::new().unwrap();
        writeln!(urls, "evil.example\n# comment\n").unwrap();
        let mut ips = tempfile::NamedTempFile::new().unwrap();
        writeln!(ips, "10.0.0.1").unwrap();

        let provider = FileBlockListProvider::new(urls.path(), ips.path());

        let url_entries = provider.entries(ListKind::Url).await.unwrap();
        assert_eq!(url_entries[0], "evil.example");
        assert_eq!(provider.entries(ListKind::Ip).await.unwrap(), vec!["10.0.0.1"]);
    }

    #[tokio::test]
    async fn test_file_provider_sees_edits_without_reload() {
        let mut ips = tempfile::NamedTempFile::new().unwrap();
        let provider = FileBlockListProvider::new("unused.txt", ips.path());
        assert!(provider.entries(ListKind::Ip).await.unwrap().is_empty());

        writeln!(ips, "10.0.0.2").unwrap();
        ips.flush().unwrap();

        assert_eq!(provider.entries(ListKind::Ip).await.unwrap(), vec!["10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_file_provider_missing_file_is_error() {
        let provider = FileBlockListProvider::new("/nonexistent/urls.txt", "/nonexistent/ips.txt");

        let err = provider.entries(ListKind::Url).await.unwrap_err();

        assert!(err.to_string().contains("/nonexistent/urls.txt"));
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticBlockListProvider::new().with_entries(ListKind::Url, ["bad.example"]);

        assert_eq!(provider.entries(ListKind::Url).await.unwrap(), vec!["bad.example"]);
        assert!(provider.entries(ListKind::Ip).await.unwrap().is_empty());
    }
}
