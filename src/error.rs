//! Error types for haraj-digest.
//!
//! Field-level extraction misses never surface here; they resolve to sentinel
//! values inside the extractor. What remains are failures that end a run.

use std::path::PathBuf;

/// Error type for collection, reconciliation and persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The snapshot source could not produce a document.
    #[error("Snapshot failed: {0}")]
    Snapshot(String),

    /// Transport failure while fetching a listing page.
    #[error("Fetching {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The listing page answered with a non-success status.
    #[error("Fetching {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// A configured or discovered URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Reading or writing a persisted file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Store or digest could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Another run currently owns the store.
    #[error("Store is locked by another run: {}", .0.display())]
    StoreLocked(PathBuf),

    /// The collection deadline elapsed before any pass completed.
    #[error("Collection deadline exceeded before the first pass completed")]
    DeadlineExceeded,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for haraj-digest operations.
pub type Result<T> = std::result::Result<T, Error>;
