//! URL utilities for ad links.
//!
//! An href is an ad link when it stays on the listing site, does not point at
//! an "add/create/new" page, and carries a numeric ad id in one of the known
//! URL shapes.

use url::Url;

use crate::patterns::{AD_ID, AD_URL_SHAPES, ID_RUN, RESERVED_PATH};

/// Resolve an href (absolute or relative) against the page URL.
///
/// # Returns
/// * The absolute URL, or `None` when the href is empty or cannot be parsed
#[must_use]
pub fn resolve(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http") {
        Url::parse(href).ok()
    } else {
        base.join(href).ok()
    }
}

/// Lowercase host with a leading `www.` removed.
#[must_use]
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// Check whether an href points at an ad on `site_host`.
///
/// Relative hrefs resolve against `base` and are therefore on-site.
#[must_use]
pub fn is_ad_link(href: &str, base: &Url, site_host: &str) -> bool {
    let Some(url) = resolve(href, base) else {
        return false;
    };
    let path = url.path().trim();

    if RESERVED_PATH.is_match(path) {
        return false;
    }

    if let Some(host) = url.host_str() {
        if normalize_host(host) != normalize_host(site_host) {
            return false;
        }
    }

    let full = url.as_str();
    if !ID_RUN.is_match(path) && !ID_RUN.is_match(full) {
        return false;
    }

    AD_URL_SHAPES
        .iter()
        .any(|rx| rx.is_match(path) || rx.is_match(full))
}

/// Numeric ad id carried by an href, or an empty string.
#[must_use]
pub fn ad_id(href: &str) -> String {
    AD_ID
        .captures(href)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
