//! One complete run: lock, load, collect, reconcile, commit.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::collector::collect;
use crate::error::Result;
use crate::options::Options;
use crate::source::SnapshotSource;
use crate::store::{reconcile, Persistence};

/// What a successful run left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ads collected during the run.
    pub collected: usize,
    /// Items in the new digest.
    pub digest_len: usize,
    /// Entries in the store after pruning.
    pub store_len: usize,
}

/// Run the scraper once with the current time.
///
/// # Errors
///
/// Fails when the store is locked, when collection fails or when the new
/// store or digest cannot be written. Nothing is written on failure.
pub async fn run<S, P>(source: &mut S, persistence: &P, options: &Options) -> Result<RunSummary>
where
    S: SnapshotSource + ?Sized,
    P: Persistence + ?Sized,
{
    run_at(source, persistence, options, Utc::now).await
}

/// [`run`] with an injectable clock, read once after collection.
///
/// # Errors
///
/// Same as [`run`].
pub async fn run_at<S, P>(
    source: &mut S,
    persistence: &P,
    options: &Options,
    clock: impl FnOnce() -> DateTime<Utc>,
) -> Result<RunSummary>
where
    S: SnapshotSource + ?Sized,
    P: Persistence + ?Sized,
{
    let _lock = persistence.lock()?;
    let store = persistence.load_store();
    let known = store.len();

    let ads = collect(source, options).await?;
    let (store, digest) = reconcile(store, &ads, clock(), options);
    persistence.commit(&store, &digest)?;

    let summary = RunSummary {
        collected: ads.len(),
        digest_len: digest.count,
        store_len: store.len(),
    };
    info!(
        collected = summary.collected,
        previous = known,
        store = summary.store_len,
        digest = summary.digest_len,
        "run complete"
    );
    Ok(summary)
}
