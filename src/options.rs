//! Configuration options for extraction, collection and reconciliation.
//!
//! The `Options` struct gathers every tunable of a run in one place so that
//! callers can override a few fields with struct-update syntax.

use std::time::Duration;

/// Hard upper bound on the number of items a digest may carry.
pub const MAX_DIGEST_ITEMS: usize = 300;

/// Configuration options for a digest run.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for the production settings.
///
/// # Example
///
/// ```rust
/// use haraj_digest::Options;
/// use std::time::Duration;
///
/// let options = Options {
///     max_passes: 3,
///     pass_delay: Duration::from_millis(250),
///     ..Options::default()
/// };
/// assert_eq!(options.top_n, 300);
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Listing page the run starts from. Relative hrefs resolve against it.
    ///
    /// Default: `https://haraj.com.sa/`
    pub site_url: String,

    /// Host an ad link must belong to (a leading `www.` is ignored on both sides).
    ///
    /// Default: `haraj.com.sa`
    pub site_host: String,

    /// Maximum description length in characters, ellipsis included.
    ///
    /// Default: `400`
    pub max_description_len: usize,

    /// Reply counts are clamped to `[0, max_reply_count]`.
    ///
    /// Default: `200`
    pub max_reply_count: u32,

    /// Sentinel written for a city or relative time that could not be found.
    ///
    /// Default: `"unspecified"`
    pub unspecified_label: String,

    /// Number of extraction passes per run.
    ///
    /// Default: `8`
    pub max_passes: usize,

    /// Pause after each `advance` and each `request_more`.
    ///
    /// Default: `1200ms`
    pub pass_delay: Duration,

    /// Stop early after this many consecutive passes that add no new ad.
    ///
    /// `None` keeps the fixed pass count.
    ///
    /// Default: `None`
    pub stop_after_idle_passes: Option<usize>,

    /// Wall-clock bound for the whole collection loop.
    ///
    /// Default: `Some(300s)`
    pub collection_deadline: Option<Duration>,

    /// Entries not observed within this window are pruned.
    ///
    /// Default: `24h`
    pub ttl: Duration,

    /// Digest size. Values above [`MAX_DIGEST_ITEMS`] are capped.
    ///
    /// Default: `300`
    pub top_n: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            site_url: "https://haraj.com.sa/".to_string(),
            site_host: "haraj.com.sa".to_string(),
            max_description_len: 400,
            max_reply_count: 200,
            unspecified_label: "unspecified".to_string(),
            max_passes: 8,
            pass_delay: Duration::from_millis(1200),
            stop_after_idle_passes: None,
            collection_deadline: Some(Duration::from_secs(300)),
            ttl: Duration::from_secs(24 * 60 * 60),
            top_n: MAX_DIGEST_ITEMS,
        }
    }
}

impl Options {
    /// Digest size after applying the hard cap.
    #[must_use]
    pub fn digest_len(&self) -> usize {
        self.top_n.min(MAX_DIGEST_ITEMS)
    }

    /// TTL as a `chrono` delta. Out-of-range values clamp to a century.
    #[must_use]
    pub fn ttl_delta(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::from_std(self.ttl).unwrap_or_else(|_| chrono::TimeDelta::days(36_500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_len_is_capped() {
        let options = Options {
            top_n: 1000,
            ..Options::default()
        };
        assert_eq!(options.digest_len(), MAX_DIGEST_ITEMS);

        let options = Options {
            top_n: 24,
            ..Options::default()
        };
        assert_eq!(options.digest_len(), 24);
    }

    #[test]
    fn ttl_delta_matches_std_duration() {
        let options = Options::default();
        assert_eq!(options.ttl_delta(), chrono::TimeDelta::hours(24));
    }
}
