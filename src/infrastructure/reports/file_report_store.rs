//! Scratch directory for generated bulk-import reports.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

/// Reports kept on disk unless [`FileReportStore::with_retention`] says otherwise.
pub const DEFAULT_RETAINED_REPORTS: usize = 32;

/// Writes each report to `<root>/temp<N>.csv`.
///
/// Reports are only kept so they can be streamed back. Only the most recent
/// ones stay on disk, and the directory is wiped by [`FileReportStore::init`]
/// on every start.
#[derive(Debug)]
pub struct FileReportStore {
    root: PathBuf,
    counter: AtomicU64,
    retention: usize,
    stored: Mutex<VecDeque<PathBuf>>,
}

impl FileReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counter: AtomicU64::new(0),
            retention: DEFAULT_RETAINED_REPORTS,
            stored: Mutex::new(VecDeque::new()),
        }
    }

    /// Keeps at most `retention` reports on disk (at least one).
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Removes any previous content and recreates the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed or created.
    pub async fn init(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Stores `content` under a fresh name and returns its path.
    ///
    /// Removes the oldest reports once more than the retention limit are
    /// on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn store(&self, content: &[u8]) -> io::Result<PathBuf> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let path = self.root.join(format!("temp{n}.csv"));

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, content).await?;

        let expired: Vec<PathBuf> = {
            let mut stored = self.stored.lock().await;
            stored.push_back(path.clone());
            let excess = stored.len().saturating_sub(self.retention);
            stored.drain(..excess).collect()
        };

        for old in expired {
            match tokio::fs::remove_file(&old).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(report = %old.display(), error = %e, "Failed to remove old report");
                }
            }
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_wipes_previous_reports() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("reports");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("stale.csv"), "old").unwrap();

        let store = FileReportStore::new(&root);
        store.init().await.unwrap();

        assert!(root.exists());
        assert!(!root.join("stale.csv").exists());
    }

    #[tokio::test]
    async fn test_store_uses_sequential_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::new(dir.path());

        let first = store.store(b"a;b;OK\n").await.unwrap();
        let second = store.store(b"c;d;OK\n").await.unwrap();

        assert_eq!(first.file_name().unwrap(), "temp1.csv");
        assert_eq!(second.file_name().unwrap(), "temp2.csv");
        assert_eq!(std::fs::read_to_string(first).unwrap(), "a;b;OK\n");
    }

    #[tokio::test]
    async fn test_store_removes_reports_beyond_retention() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::new(dir.path()).with_retention(2);

        let first = store.store(b"1").await.unwrap();
        let second = store.store(b"2").await.unwrap();
        let third = store.store(b"3").await.unwrap();

        assert!(!first.exists());
        assert!(second.exists());
        assert_eq!(std::fs::read_to_string(third).unwrap(), "3");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
