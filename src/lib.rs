//! # haraj-digest
//!
//! Classified-ad listing scraper with a time-decayed, reply-ranked digest.
//!
//! The crate watches a progressively loading listing page, pulls ad records
//! out of its unstable markup, merges repeated sightings of the same ad, and
//! keeps a durable store from which a ranked "top" digest is produced on
//! every run.
//!
//! ## Quick Start
//!
//! ```rust
//! use haraj_digest::{extract_ads, Options};
//!
//! let html = r#"<html><body><div class="post">
//!     <a href="/12345678">سيارة للبيع بحالة ممتازة</a>
//! </div></body></html>"#;
//!
//! let ads = extract_ads(html, &Options::default())?;
//! assert_eq!(ads[0].id, "12345678");
//! assert_eq!(ads[0].city, "unspecified");
//! # Ok::<(), haraj_digest::Error>(())
//! ```
//!
//! ## Pieces
//!
//! - **Extractor** ([`extractor`]): URL-shape ad detection, card grouping
//!   and best-effort field extraction from one snapshot
//! - **Collector** ([`collector`]): repeated passes over a [`SnapshotSource`],
//!   merging observations per identity key
//! - **Store** ([`store`]): merge, TTL pruning and ranking into a [`Digest`],
//!   persisted atomically

mod error;
mod options;
mod patterns;
mod record;

/// DOM query helpers over `dom_query` documents.
pub mod dom;

/// Digit normalisation, Arabic detection, truncation and collation.
pub mod text;

/// URL utilities for href resolution and the ad-link test.
pub mod url_utils;

/// Character encoding detection and transcoding.
pub mod encoding;

/// Ad record extraction from a single snapshot.
pub mod extractor;

/// Multi-pass collection over a snapshot source.
pub mod collector;

/// Snapshot sources (HTTP and replay).
pub mod source;

/// Keyed store, reconciliation and persistence.
pub mod store;

/// One full run from lock to commit.
pub mod pipeline;

/// Tracing subscriber setup.
pub mod telemetry;

// Public API - re-exports
pub use collector::{collect, Collection};
pub use error::{Error, Result};
pub use extractor::PageContext;
pub use options::{Options, MAX_DIGEST_ITEMS};
pub use pipeline::{run, RunSummary};
pub use record::{format_timestamp, parse_timestamp, AdRecord, Digest, StoreEntry};
pub use source::{HttpSnapshotSource, HttpSourceConfig, ReplaySource, Snapshot, SnapshotSource};
pub use store::{reconcile, JsonFilePersistence, Persistence, Store};

/// Extracts ads from an HTML listing page taken from `options.site_url`.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] when `options.site_url` does not parse.
pub fn extract_ads(html: &str, options: &Options) -> Result<Vec<AdRecord>> {
    extract_ads_from_url(html, &options.site_url, options)
}

/// Extracts ads from an HTML page taken from `url`; relative links resolve
/// against it.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] when `url` does not parse.
pub fn extract_ads_from_url(html: &str, url: &str, options: &Options) -> Result<Vec<AdRecord>> {
    let ctx = PageContext::new(url, &options.site_host)?;
    let doc = dom::parse(html);
    Ok(extractor::extract_ads_from_document(&doc, &ctx, options))
}

/// Extracts ads from raw page bytes, detecting the charset from the
/// document's meta declarations.
///
/// Invalid sequences are replaced with U+FFFD rather than causing errors.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] when `options.site_url` does not parse.
pub fn extract_ads_bytes(html: &[u8], options: &Options) -> Result<Vec<AdRecord>> {
    let html = encoding::decode_body(html, None);
    extract_ads(&html, options)
}
