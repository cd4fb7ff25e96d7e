//! Incremental collection over a progressively loading listing.
//!
//! The collector re-snapshots the page pass after pass and folds every
//! observation into one record per identity key. Passes are strictly
//! sequential: the source is a single stateful page and is never queried
//! concurrently.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;

use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::extractor::extract_snapshot;
use crate::options::Options;
use crate::record::AdRecord;
use crate::source::SnapshotSource;

/// Outcome of folding one batch into a [`Collection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Keys seen for the first time.
    pub new: usize,
    /// Known keys whose reply count went up.
    pub improved: usize,
}

/// Best-known record per identity key, in first-seen order.
///
/// Merge policy: the newest observation's fields always replace the stored
/// ones, while the reply count keeps its running maximum.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    order: Vec<String>,
    records: HashMap<String, AdRecord>,
}

impl Collection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a batch of observations in.
    pub fn absorb(&mut self, batch: impl IntoIterator<Item = AdRecord>) -> PassStats {
        let mut stats = PassStats::default();
        for mut record in batch {
            match self.records.entry(record.identity_key().to_string()) {
                Entry::Vacant(slot) => {
                    self.order.push(slot.key().clone());
                    slot.insert(record);
                    stats.new += 1;
                }
                Entry::Occupied(mut slot) => {
                    let known = slot.get().reply_count;
                    if record.reply_count > known {
                        stats.improved += 1;
                    }
                    record.reply_count = record.reply_count.max(known);
                    slot.insert(record);
                }
            }
        }
        stats
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AdRecord> {
        self.records.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records in the order their keys were first seen.
    #[must_use]
    pub fn into_records(mut self) -> Vec<AdRecord> {
        self.order
            .iter()
            .filter_map(|key| self.records.remove(key))
            .collect()
    }
}

/// Run up to `options.max_passes` extraction passes against `source`.
///
/// Each pass takes a snapshot, extracts it and merges the result. Between
/// passes the source is asked to advance and then to load more, each
/// followed by `options.pass_delay`. Those two requests are best-effort:
/// their failures are logged and collection goes on.
///
/// # Errors
///
/// A snapshot failure ends the run with that error. If
/// `options.collection_deadline` elapses before the first pass completes the
/// result is [`Error::DeadlineExceeded`]; later expiry returns what was
/// collected so far.
pub async fn collect<S>(source: &mut S, options: &Options) -> Result<Vec<AdRecord>>
where
    S: SnapshotSource + ?Sized,
{
    let deadline = options.collection_deadline.map(|d| Instant::now() + d);
    let mut collection = Collection::new();
    let mut completed = 0usize;
    let mut idle = 0usize;
    let mut expired = false;

    for pass in 1..=options.max_passes {
        let step = async {
            let snapshot = source.snapshot().await?;
            let records = extract_snapshot(&snapshot, options);
            Ok::<_, Error>((records.len(), collection.absorb(records)))
        };
        let Some(outcome) = within(deadline, step).await else {
            expired = true;
            break;
        };
        let (found, stats) = outcome?;
        completed += 1;

        debug!(
            pass,
            found,
            new = stats.new,
            improved = stats.improved,
            total = collection.len(),
            "collection pass"
        );

        idle = if stats.new == 0 { idle + 1 } else { 0 };
        if options.stop_after_idle_passes.is_some_and(|limit| idle >= limit) {
            debug!(pass, idle, "no new ads, stopping early");
            break;
        }
        if pass == options.max_passes {
            break;
        }

        if within(deadline, load_next(source, options)).await.is_none() {
            expired = true;
            break;
        }
    }

    if expired {
        if completed == 0 {
            return Err(Error::DeadlineExceeded);
        }
        warn!(passes = completed, "collection deadline reached");
    }

    info!(passes = completed, ads = collection.len(), "collection finished");
    Ok(collection.into_records())
}

/// Scroll, pause, press "show more", pause.
async fn load_next<S>(source: &mut S, options: &Options)
where
    S: SnapshotSource + ?Sized,
{
    if let Err(e) = source.advance().await {
        warn!(error = %e, "advance failed");
    }
    sleep(options.pass_delay).await;

    if let Err(e) = source.request_more().await {
        warn!(error = %e, "load more failed");
    }
    sleep(options.pass_delay).await;
}

/// Await `fut`, giving up at `deadline` when one is set.
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(at) => timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}
