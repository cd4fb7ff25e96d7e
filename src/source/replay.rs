//! Offline source that replays saved HTML snapshots in order.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{Snapshot, SnapshotSource};
use crate::error::{Error, Result};

/// Plays back a fixed sequence of snapshots.
///
/// `advance` moves to the next snapshot and stays on the last one once the
/// sequence is exhausted. `request_more` does nothing.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    snapshots: Vec<Snapshot>,
    position: usize,
}

impl ReplaySource {
    #[must_use]
    pub fn new(snapshots: Vec<Snapshot>) -> Self {
        Self {
            snapshots,
            position: 0,
        }
    }

    /// Load every `*.html` file of `dir`, in file-name order, as taken from `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the directory or a file cannot be read and
    /// [`Error::Snapshot`] when the directory holds no HTML file.
    pub fn from_dir(dir: &Path, url: &Url) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
            let path = entry.map_err(|e| Error::io(dir, e))?.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("html")) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(Error::Snapshot(format!("no .html files in {}", dir.display())));
        }
        paths.sort();

        let mut snapshots = Vec::with_capacity(paths.len());
        for path in &paths {
            let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
            snapshots.push(Snapshot::new(url.clone(), crate::encoding::decode_body(&bytes, None)));
        }
        debug!(dir = %dir.display(), snapshots = snapshots.len(), "loaded replay snapshots");
        Ok(Self::new(snapshots))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SnapshotSource for ReplaySource {
    async fn snapshot(&mut self) -> Result<Snapshot> {
        self.snapshots
            .get(self.position)
            .cloned()
            .ok_or_else(|| Error::Snapshot("replay source holds no snapshots".to_string()))
    }

    async fn advance(&mut self) -> Result<()> {
        if self.position + 1 < self.snapshots.len() {
            self.position += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://haraj.com.sa/").expect("url")
    }

    #[tokio::test]
    async fn advances_and_sticks_on_last() {
        let mut source = ReplaySource::new(vec![
            Snapshot::new(url(), "<p>1</p>"),
            Snapshot::new(url(), "<p>2</p>"),
        ]);
        assert_eq!(source.snapshot().await.expect("first").html, "<p>1</p>");
        source.advance().await.expect("advance");
        source.request_more().await.expect("request more");
        assert_eq!(source.snapshot().await.expect("second").html, "<p>2</p>");
        source.advance().await.expect("advance");
        assert_eq!(source.snapshot().await.expect("still second").html, "<p>2</p>");
    }

    #[tokio::test]
    async fn empty_source_fails_to_snapshot() {
        let mut source = ReplaySource::new(Vec::new());
        assert!(matches!(source.snapshot().await, Err(Error::Snapshot(_))));
    }

    #[test]
    fn from_dir_reads_html_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("02.html"), "<p>ب</p>").expect("write");
        fs::write(dir.path().join("01.html"), "<p>أ</p>").expect("write");
        fs::write(dir.path().join("notes.txt"), "skip").expect("write");

        let source = ReplaySource::from_dir(dir.path(), &url()).expect("replay");
        assert_eq!(source.len(), 2);
        assert_eq!(source.snapshots[0].html, "<p>أ</p>");
    }

    #[test]
    fn from_dir_without_html_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            ReplaySource::from_dir(dir.path(), &url()),
            Err(Error::Snapshot(_))
        ));
    }
}
