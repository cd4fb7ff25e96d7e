//! Durable keyed store and digest ranking.
//!
//! A run folds its collected ads into the store, drops entries that have not
//! been seen within the TTL and ranks what is left into a bounded digest.
//! Reconciliation itself does no locking; callers hold the [`RunLock`] of
//! their persistence for the whole read-merge-prune-write cycle.

mod persistence;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::options::{Options, MAX_DIGEST_ITEMS};
use crate::record::{AdRecord, Digest, StoreEntry};
use crate::text::compare_locale;

pub use persistence::{JsonFilePersistence, Persistence, RunLock, DIGEST_FILE, STORE_FILE};

/// Every known ad, keyed by identity key. Serialised as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    entries: BTreeMap<String, StoreEntry>,
}

/// Counts from one [`Store::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StoreEntry> {
        self.entries.get(key)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoreEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace an entry as-is.
    pub fn insert(&mut self, key: impl Into<String>, entry: StoreEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Fold observations made at `now` into the store.
    ///
    /// New keys get `first_seen_at = last_seen_at = now`. Known keys take the
    /// new fields and `last_seen_at = now`; `first_seen_at` is never touched
    /// and `latest_reply_count` never decreases.
    pub fn merge<'r>(&mut self, ads: impl IntoIterator<Item = &'r AdRecord>, now: DateTime<Utc>) -> MergeStats {
        let mut stats = MergeStats::default();
        for ad in ads {
            if let Some(entry) = self.entries.get_mut(ad.identity_key()) {
                entry.observe(ad.clone(), now);
                stats.updated += 1;
            } else {
                self.entries.insert(
                    ad.identity_key().to_string(),
                    StoreEntry::first_observation(ad.clone(), now),
                );
                stats.inserted += 1;
            }
        }
        stats
    }

    /// Drop entries last seen before `now - ttl`. Returns how many went.
    ///
    /// The boundary is inclusive: an entry seen exactly at `now - ttl` stays.
    /// Entries with no usable timestamp are dropped.
    pub fn prune(&mut self, now: DateTime<Utc>, ttl: TimeDelta) -> usize {
        let cutoff = now.checked_sub_signed(ttl);
        let before = self.entries.len();
        self.entries.retain(|_, entry| match (entry.seen_at(), cutoff) {
            (Some(seen), Some(cutoff)) => seen >= cutoff,
            (Some(_), None) => true,
            (None, _) => false,
        });
        before - self.entries.len()
    }

    /// The `top_n` best entries (capped at [`MAX_DIGEST_ITEMS`]).
    ///
    /// Order: highest `latest_reply_count` first, then description by
    /// locale collation, then identity key so the result is total.
    #[must_use]
    pub fn rank(&self, top_n: usize) -> Vec<StoreEntry> {
        let mut ranked: Vec<(&String, &StoreEntry)> = self.entries.iter().collect();
        ranked.sort_by(|(ka, a), (kb, b)| rank_order(a, b).then_with(|| ka.cmp(kb)));
        ranked
            .into_iter()
            .take(top_n.min(MAX_DIGEST_ITEMS))
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}

fn rank_order(a: &StoreEntry, b: &StoreEntry) -> Ordering {
    b.latest_reply_count
        .cmp(&a.latest_reply_count)
        .then_with(|| compare_locale(&a.record.description, &b.record.description))
}

/// Merge `ads` into `store`, prune by TTL and rank the survivors.
///
/// Returns the new durable store and the digest for this run.
#[must_use]
pub fn reconcile(mut store: Store, ads: &[AdRecord], now: DateTime<Utc>, options: &Options) -> (Store, Digest) {
    let merged = store.merge(ads, now);
    let pruned = store.prune(now, options.ttl_delta());
    let digest = Digest::new(now, store.rank(options.digest_len()));

    debug!(
        inserted = merged.inserted,
        updated = merged.updated,
        pruned,
        store = store.len(),
        digest = digest.count,
        "reconciled store"
    );
    (store, digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).single().expect("now")
    }

    fn ad(id: &str, description: &str, replies: u32) -> AdRecord {
        AdRecord {
            id: id.to_string(),
            description: description.to_string(),
            city: "جدة".to_string(),
            relative_time: "الآن".to_string(),
            reply_count: replies,
            link: format!("https://haraj.com.sa/{id}"),
        }
    }

    #[test]
    fn merge_counts_inserts_and_updates() {
        let mut store = Store::new();
        let stats = store.merge(&[ad("1111111", "سيارة", 1), ad("2222222", "شقة", 0)], now());
        assert_eq!(stats, MergeStats { inserted: 2, updated: 0 });

        let stats = store.merge(&[ad("1111111", "سيارة", 3)], now());
        assert_eq!(stats, MergeStats { inserted: 0, updated: 1 });
        assert_eq!(store.get("1111111").map(|e| e.latest_reply_count), Some(3));
    }

    #[test]
    fn prune_drops_entries_without_timestamps() {
        let mut store = Store::new();
        let mut entry = StoreEntry::first_observation(ad("1111111", "سيارة", 1), now());
        entry.first_seen_at = None;
        entry.last_seen_at = None;
        store.insert("1111111", entry);

        assert_eq!(store.prune(now(), TimeDelta::hours(24)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn rank_breaks_full_ties_by_key() {
        let mut store = Store::new();
        store.merge(&[ad("2222222", "سيارة", 4), ad("1111111", "سيارة", 4)], now());
        let ids: Vec<_> = store.rank(10).into_iter().map(|e| e.record.id).collect();
        assert_eq!(ids, ["1111111", "2222222"]);
    }

    #[test]
    fn store_serializes_as_plain_object() {
        let mut store = Store::new();
        store.merge(&[ad("1111111", "سيارة", 1)], now());
        let json = serde_json::to_value(&store).expect("serialize");
        assert!(json.get("1111111").is_some());
        let back: Store = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, store);
    }
}
