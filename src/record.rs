//! Records produced by extraction and kept by the store.
//!
//! Field names on the wire are camelCase; the names written by earlier
//! versions of the scraper (`desc`, `time`, `replies`, `latestReplies`) are
//! still accepted on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ad observed in a single snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRecord {
    /// Numeric ad id parsed from the link; may be empty.
    #[serde(default)]
    pub id: String,

    /// Title text, truncated for display.
    #[serde(default, alias = "desc")]
    pub description: String,

    /// City name, or the unspecified sentinel.
    #[serde(default)]
    pub city: String,

    /// Relative time phrase as shown on the page ("قبل 3 ساعات").
    #[serde(default, alias = "time")]
    pub relative_time: String,

    /// Reply count, clamped to the configured maximum.
    #[serde(default, alias = "replies")]
    pub reply_count: u32,

    /// Absolute URL of the ad.
    #[serde(default)]
    pub link: String,
}

impl AdRecord {
    /// Key under which observations of the same ad are merged:
    /// the id, else the link, else the description.
    ///
    /// Falling back to the truncated description can conflate two distinct
    /// ads with identical visible text; nothing on the page disambiguates them.
    #[must_use]
    pub fn identity_key(&self) -> &str {
        if !self.id.is_empty() {
            &self.id
        } else if !self.link.is_empty() {
            &self.link
        } else {
            &self.description
        }
    }
}

/// A stored ad together with its observation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEntry {
    #[serde(flatten)]
    pub record: AdRecord,

    /// First observation. Written once.
    #[serde(default, with = "iso_timestamp")]
    pub first_seen_at: Option<DateTime<Utc>>,

    /// Most recent observation.
    #[serde(default, with = "iso_timestamp")]
    pub last_seen_at: Option<DateTime<Utc>>,

    /// Highest reply count ever observed for this entry.
    #[serde(default, alias = "latestReplies")]
    pub latest_reply_count: u32,
}

impl StoreEntry {
    /// Entry for an ad seen for the first time at `now`.
    #[must_use]
    pub fn first_observation(record: AdRecord, now: DateTime<Utc>) -> Self {
        Self {
            latest_reply_count: record.reply_count,
            record,
            first_seen_at: Some(now),
            last_seen_at: Some(now),
        }
    }

    /// Fold a new observation in: fields take the new values, `first_seen_at`
    /// is kept and `latest_reply_count` keeps its running maximum.
    pub fn observe(&mut self, record: AdRecord, now: DateTime<Utc>) {
        self.latest_reply_count = self.latest_reply_count.max(record.reply_count);
        self.record = record;
        self.last_seen_at = Some(now);
        if self.first_seen_at.is_none() {
            self.first_seen_at = Some(now);
        }
    }

    /// Timestamp used for ageing: last seen, else first seen.
    #[must_use]
    pub fn seen_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen_at.or(self.first_seen_at)
    }
}

/// Ranked, bounded snapshot of the store produced by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    #[serde(with = "iso_timestamp::required")]
    pub updated_at: DateTime<Utc>,
    pub count: usize,
    pub items: Vec<StoreEntry>,
}

impl Digest {
    #[must_use]
    pub fn new(updated_at: DateTime<Utc>, items: Vec<StoreEntry>) -> Self {
        Self {
            updated_at,
            count: items.len(),
            items,
        }
    }
}

/// Format a timestamp the way the digest consumers expect
/// (`2024-05-01T12:00:00.000Z`).
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 / RFC 3339 timestamp, `None` when malformed.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Millisecond ISO timestamps. Reading is lenient: a missing, non-string or
/// malformed value becomes `None` instead of failing the whole document.
mod iso_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&super::format_timestamp(ts)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(d)?;
        Ok(value
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(super::parse_timestamp))
    }

    pub mod required {
        use chrono::{DateTime, Utc};
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&super::super::format_timestamp(ts))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
            let raw = String::deserialize(d)?;
            super::super::parse_timestamp(&raw)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
        }
    }
}
