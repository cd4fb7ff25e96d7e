//! Snapshot sources: where page documents come from.
//!
//! The collector only sees the [`SnapshotSource`] trait. Two implementations
//! ship with the crate: [`HttpSnapshotSource`] fetches the live listing and
//! follows its "show more" link, and [`ReplaySource`] plays back saved HTML.

mod http;
mod replay;

use async_trait::async_trait;
use url::Url;

use crate::dom::{self, Document};
use crate::error::Result;

pub use http::{HttpSnapshotSource, HttpSourceConfig};
pub use replay::ReplaySource;

/// A rendered page as HTML, with the URL it was taken from.
///
/// Documents are parsed on demand so snapshots can cross await points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub url: Url,
    pub html: String,
}

impl Snapshot {
    #[must_use]
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    /// Parse the snapshot into a document tree.
    #[must_use]
    pub fn document(&self) -> Document {
        dom::parse(&self.html)
    }
}

/// A single stateful page that can be snapshotted and grown.
#[async_trait]
pub trait SnapshotSource: Send {
    /// Current state of the page.
    ///
    /// # Errors
    ///
    /// Any failure here is fatal to the run.
    async fn snapshot(&mut self) -> Result<Snapshot>;

    /// Activate the "show more" control, if the page has one.
    ///
    /// # Errors
    ///
    /// Failures are logged by the collector and otherwise ignored.
    async fn request_more(&mut self) -> Result<()> {
        Ok(())
    }

    /// Scroll-equivalent: move the page towards more content.
    ///
    /// # Errors
    ///
    /// Failures are logged by the collector and otherwise ignored.
    async fn advance(&mut self) -> Result<()> {
        Ok(())
    }
}
