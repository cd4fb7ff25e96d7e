//! Compiled regex patterns and CSS selectors for ad extraction.
//!
//! All patterns are compiled once on first use with `LazyLock`.
//! Identity of an ad is established by URL shape, which is stable across
//! redesigns of the listing page; the CSS selectors below are only used for
//! best-effort field lookups.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Ad URL Patterns
// =============================================================================

/// Paths that create or post an ad rather than show one.
pub static RESERVED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(add|create|new)\b").expect("RESERVED_PATH regex")
});

/// A run of at least six digits, the shortest ad identifier the site issues.
pub static ID_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{6,}").expect("ID_RUN regex"));

/// Known ad URL shapes: bare numeric id, numeric id plus slug, and
/// `/ad/<id>` or `/post/<id>` (singular or plural).
pub static AD_URL_SHAPES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)^/?\d{6,}(?:/?|$)").expect("bare id shape"),
        Regex::new(r"(?i)^/?\d{6,}/[^/?#]+").expect("id slug shape"),
        Regex::new(r"(?i)/(?:ads?|posts?)/(\d{6,})(?:[/-]|$)").expect("ad path shape"),
    ]
});

/// Extracts the numeric ad id from an href.
pub static AD_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d{6,})(?:[/-]|$)").expect("AD_ID regex"));

// =============================================================================
// Text Patterns
// =============================================================================

/// A relative-time phrase anywhere in a string ("now" or "<n> <unit> ago").
pub static RELATIVE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"الآن|قبل\s+\d+\s*(?:دقيقة|دقائق|ساعة|ساعات|يوم|أيام|أسبوع|أسابيع|شهر|أشهر)")
        .expect("RELATIVE_TIME regex")
});

/// A line that starts with a relative-time phrase.
pub static RELATIVE_TIME_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:الآن|قبل\s+\d+\s*(?:دقيقة|دقائق|ساعة|ساعات|يوم|أيام|أسبوع|أسابيع|شهر|أشهر))")
        .expect("RELATIVE_TIME_LINE regex")
});

/// Strings made only of separator punctuation.
pub static SEPARATOR_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[.•·|]+$").expect("SEPARATOR_ONLY regex"));

/// "Create new ad" placeholders, Arabic and English.
pub static PLACEHOLDER_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:إضافة\s+عرض|أضف\s+إعلان|Add\s+Ad)$").expect("PLACEHOLDER regex")
});

/// A reply count after digit normalisation: one to three ASCII digits.
pub static REPLY_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,3}$").expect("REPLY_COUNT regex"));

/// Label of the "show more" control at the bottom of the listing.
pub const LOAD_MORE_LABEL: &str = "مشاهدة المزيد";

// =============================================================================
// CSS Selectors
// =============================================================================

/// Every anchor that carries an href.
pub const ANCHOR_SELECTOR: &str = "a[href]";

/// Overflow-clipped, ellipsis-truncated title spans.
pub const TITLE_SPAN_SELECTOR: &str =
    r#"span.overflow-hidden.text-ellipsis, span[class*="text-ellipsis"]"#;

/// Title span inside the dedicated title link, falling back to any title span.
pub const LINKED_TITLE_SELECTOR: &str = r#"a[data-testid="post-title-link"] span.overflow-hidden.text-ellipsis, span.overflow-hidden.text-ellipsis, span[class*="text-ellipsis"]"#;

/// Anchors pointing at a city listing.
pub const CITY_LINK_SELECTOR: &str = r#"a[href^="/city/"]"#;

/// Short single-line spans that usually carry the city or the time.
pub const CITY_SPAN_SELECTOR: &str =
    r#"span.overflow-hidden.overflow-ellipsis.whitespace-nowrap, span[class*="overflow-ellipsis"]"#;

/// Elements scanned for a relative-time line when the styled span is absent.
pub const TIME_CANDIDATE_SELECTOR: &str = r#"[dir="rtl"], span, div"#;

/// Class tokens of the styled relative-time span.
pub const TIME_SPAN_CLASSES: &[&str] = &[
    "max-w-[90%]",
    "overflow-hidden",
    "overflow-ellipsis",
    "whitespace-nowrap",
];

/// Icon identifier of the comment counter.
pub const COMMENT_ICON: &str = "comments-alt";

/// Class carried by the comment icon on older layouts.
pub const COMMENT_ICON_CLASS: &str = "fa-comments-alt";

/// Tags a card may be rooted at.
pub const CARD_TAGS: &[&str] = &["article", "li", "div", "section"];

/// Tags whose text never counts as meaningful.
pub const NON_TEXT_TAGS: &[&str] = &["svg", "img", "i", "use", "path", "button", "script", "style"];
