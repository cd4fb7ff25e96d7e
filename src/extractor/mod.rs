//! Ad record extraction from a single page snapshot.
//!
//! Extraction runs in four steps:
//!
//! 1. **Discovery** ([`discovery`]): ordered strategies find candidate
//!    elements, ad-link anchors first and title spans as a fallback.
//! 2. **Grouping**: each candidate is lifted to its nearest container, the
//!    "card". Several anchors may share one card.
//! 3. **Fields** ([`fields`]): link, description, city, relative time and
//!    reply count are read independently; a miss never drops the card.
//! 4. **Validity** ([`validity`]): cards without an ad link or with a
//!    non-Arabic or placeholder description are dropped silently.
//!
//! Extraction is pure: the same snapshot always yields the same records, in
//! card order, with duplicates of one identity key merged.

pub mod discovery;
pub mod fields;
pub mod load_more;
pub mod validity;

use tracing::debug;
use url::Url;

use crate::collector::Collection;
use crate::dom::{Document, NodeRef};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::record::AdRecord;
use crate::source::Snapshot;
use crate::text::truncate;
use crate::url_utils;

pub use load_more::{find_load_more, LoadMore};

/// Where a snapshot was taken and which host its ads must live on.
#[derive(Debug, Clone)]
pub struct PageContext {
    base: Url,
    site_host: String,
}

impl PageContext {
    /// Context for a page at `site_url` whose ads live on `site_host`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] when `site_url` is not an absolute URL.
    pub fn new(site_url: &str, site_host: &str) -> Result<Self> {
        let base = Url::parse(site_url).map_err(|e| Error::InvalidUrl(format!("{site_url}: {e}")))?;
        Ok(Self::with_base(base, site_host))
    }

    #[must_use]
    pub fn with_base(base: Url, site_host: &str) -> Self {
        Self {
            base,
            site_host: url_utils::normalize_host(site_host),
        }
    }

    #[must_use]
    pub fn site_host(&self) -> &str {
        &self.site_host
    }

    /// Absolute form of an href found on the page.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<Url> {
        url_utils::resolve(href, &self.base)
    }

    /// Whether `href` points at an ad on the site.
    #[must_use]
    pub fn is_ad_link(&self, href: &str) -> bool {
        url_utils::is_ad_link(href, &self.base, &self.site_host)
    }
}

/// Extract ads from a fetched snapshot, resolving links against its URL.
#[must_use]
pub fn extract_snapshot(snapshot: &Snapshot, options: &Options) -> Vec<AdRecord> {
    let ctx = PageContext::with_base(snapshot.url.clone(), &options.site_host);
    extract_ads_from_document(&snapshot.document(), &ctx, options)
}

/// Extract every valid ad from a parsed document.
#[must_use]
pub fn extract_ads_from_document(doc: &Document, ctx: &PageContext, options: &Options) -> Vec<AdRecord> {
    let Some(root) = doc.select("html").nodes().first().copied() else {
        return Vec::new();
    };

    let cards = discovery::discover_cards(&root, ctx);
    let mut collection = Collection::new();
    let mut rejected = 0usize;
    for card in &cards {
        match card_record(card, ctx, options) {
            Some(record) => {
                collection.absorb(std::iter::once(record));
            }
            None => rejected += 1,
        }
    }

    debug!(
        cards = cards.len(),
        accepted = collection.len(),
        rejected,
        "extracted snapshot"
    );
    collection.into_records()
}

/// Build the record for one card, `None` when the card is not a valid ad.
fn card_record(card: &NodeRef, ctx: &PageContext, options: &Options) -> Option<AdRecord> {
    let anchor = fields::link_anchor(card, ctx);
    let link = anchor
        .as_ref()
        .and_then(|a| fields::link(a, ctx))
        .unwrap_or_default();
    let title = fields::title_element(card, anchor.as_ref());
    let description = fields::description(card, title.as_ref());

    if !validity::is_valid(&description, &link, ctx) {
        return None;
    }

    let unspecified = || options.unspecified_label.clone();
    Some(AdRecord {
        id: url_utils::ad_id(&link),
        description: truncate(&description, options.max_description_len).trim().to_string(),
        city: fields::city(card).unwrap_or_else(unspecified),
        relative_time: fields::relative_time(card).unwrap_or_else(unspecified),
        reply_count: fields::reply_count(card, title.as_ref(), options.max_reply_count),
        link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;

    fn ctx() -> PageContext {
        PageContext::new("https://haraj.com.sa/", "www.Haraj.com.sa").expect("context")
    }

    #[test]
    fn context_rejects_relative_site_url() {
        assert!(matches!(
            PageContext::new("/relative", "haraj.com.sa"),
            Err(Error::InvalidUrl(_))
        ));
        assert_eq!(ctx().site_host(), "haraj.com.sa");
    }

    #[test]
    fn builds_full_record() {
        let doc = parse(
            r#"<html><body><div class="post">
                <a href="/12345678/تويوتا"><span class="overflow-hidden text-ellipsis">تويوتا كامري 2020</span></a>
                <a href="/city/جدة">جدة</a>
                <span dir="rtl" class="max-w-[90%] overflow-hidden overflow-ellipsis whitespace-nowrap">قبل 3 ساعات</span>
                <svg data-icon="comments-alt"></svg><span>٤</span>
            </div></body></html>"#,
        );
        let ads = extract_ads_from_document(&doc, &ctx(), &Options::default());
        assert_eq!(ads.len(), 1);
        let ad = &ads[0];
        assert_eq!(ad.id, "12345678");
        assert_eq!(ad.description, "تويوتا كامري 2020");
        assert_eq!(ad.city, "جدة");
        assert_eq!(ad.relative_time, "قبل 3 ساعات");
        assert_eq!(ad.reply_count, 4);
        assert!(ad.link.starts_with("https://haraj.com.sa/12345678/"));
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let long = "سيارة ".repeat(40);
        let html = format!(r#"<div><a href="/12345678"><span class="overflow-hidden text-ellipsis">{long}</span></a></div>"#);
        let options = Options {
            max_description_len: 20,
            ..Options::default()
        };
        let ads = extract_ads_from_document(&parse(&html), &ctx(), &options);
        assert_eq!(ads[0].description.chars().count(), 20);
        assert!(ads[0].description.ends_with('…'));
    }

    #[test]
    fn duplicate_cards_merge_by_identity() {
        let doc = parse(
            r#"<ul>
                <li><a href="/12345678">سيارة للبيع</a></li>
                <li><a href="/12345678">سيارة للبيع</a><svg data-icon="comments-alt"></svg><span>9</span></li>
            </ul>"#,
        );
        let ads = extract_ads_from_document(&doc, &ctx(), &Options::default());
        assert_eq!(ads.len(), 1);
        assert_eq!(ads[0].reply_count, 9);
    }

    #[test]
    fn snapshot_links_resolve_against_snapshot_url() {
        let snapshot = Snapshot::new(
            Url::parse("https://haraj.com.sa/tags/cars").expect("url"),
            r#"<div><a href="/12345678">سيارة للبيع</a></div>"#,
        );
        let ads = extract_snapshot(&snapshot, &Options::default());
        assert_eq!(ads[0].link, "https://haraj.com.sa/12345678");
    }
}
