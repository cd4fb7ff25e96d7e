//! Per-card field extractors.
//!
//! Every extractor is independent and best-effort: a miss yields `None` (or
//! zero for the reply count) and never prevents the other fields from being
//! read.

use super::PageContext;
use crate::dom::{self, NodeRef};
use crate::patterns::{
    ANCHOR_SELECTOR, CARD_TAGS, CITY_LINK_SELECTOR, CITY_SPAN_SELECTOR, COMMENT_ICON,
    COMMENT_ICON_CLASS, LINKED_TITLE_SELECTOR, RELATIVE_TIME, RELATIVE_TIME_LINE, REPLY_COUNT,
    TIME_CANDIDATE_SELECTOR, TIME_SPAN_CLASSES, TITLE_SPAN_SELECTOR,
};
use crate::text::to_ascii_digits;

/// City names are short labels; longer spans are something else.
const CITY_LEN: std::ops::RangeInclusive<usize> = 2..=20;

/// The ad-link anchor of a card.
///
/// First ad-link anchor inside the card; otherwise the anchor wrapping the
/// card's title span, or the first anchor next to it.
#[must_use]
pub fn link_anchor<'a>(card: &NodeRef<'a>, ctx: &PageContext) -> Option<NodeRef<'a>> {
    let is_ad = |a: &NodeRef| dom::attribute(a, "href").is_some_and(|href| ctx.is_ad_link(&href));

    if let Some(anchor) = dom::select_all(card, ANCHOR_SELECTOR).into_iter().find(|a| is_ad(a)) {
        return Some(anchor);
    }

    let title = dom::select_first(card, TITLE_SPAN_SELECTOR)?;
    let anchor = dom::closest(&title, &["a"]).or_else(|| {
        title
            .parent()
            .and_then(|parent| dom::select_first(&parent, ANCHOR_SELECTOR))
    })?;
    is_ad(&anchor).then_some(anchor)
}

/// Absolute URL of the card's ad link.
#[must_use]
pub fn link(anchor: &NodeRef, ctx: &PageContext) -> Option<String> {
    let href = dom::attribute(anchor, "href")?;
    ctx.resolve(&href).map(String::from)
}

/// Element carrying the title: the title span under the link, else the link
/// itself; without a link, the card's own title span.
#[must_use]
pub fn title_element<'a>(card: &NodeRef<'a>, anchor: Option<&NodeRef<'a>>) -> Option<NodeRef<'a>> {
    match anchor {
        Some(anchor) => dom::select_first(anchor, LINKED_TITLE_SELECTOR).or(Some(*anchor)),
        None => dom::select_first(card, LINKED_TITLE_SELECTOR),
    }
}

/// Title text, or the longest meaningful text in the card.
#[must_use]
pub fn description(card: &NodeRef, title: Option<&NodeRef>) -> String {
    let text = title.map(dom::trimmed_text).unwrap_or_default();
    if text.is_empty() {
        dom::meaningful_text(card)
    } else {
        text
    }
}

/// City from a city-listing link, else from the first short span that is
/// not a relative time.
#[must_use]
pub fn city(card: &NodeRef) -> Option<String> {
    let from_link = dom::select_first(card, CITY_LINK_SELECTOR)
        .map(|a| dom::meaningful_text(&a))
        .filter(|text| !text.is_empty());
    if from_link.is_some() {
        return from_link;
    }

    dom::select_all(card, CITY_SPAN_SELECTOR)
        .iter()
        .map(dom::trimmed_text)
        .filter(|text| !text.is_empty() && !RELATIVE_TIME.is_match(text))
        .find(|text| CITY_LEN.contains(&text.chars().count()))
}

/// Relative time from the styled right-to-left span, else the first line
/// anywhere in the card that reads like "now" or "<n> <unit> ago".
#[must_use]
pub fn relative_time(card: &NodeRef) -> Option<String> {
    let styled = dom::find_by_attribute(card, "span", "dir", |dir| dir.eq_ignore_ascii_case("rtl"))
        .into_iter()
        .find(|span| dom::has_classes(span, TIME_SPAN_CLASSES))
        .map(|span| dom::trimmed_text(&span))
        .filter(|text| !text.is_empty());
    if styled.is_some() {
        return styled;
    }

    let candidates = dom::select_all(card, TIME_CANDIDATE_SELECTOR);
    dom::find_by_text(&candidates, &RELATIVE_TIME_LINE).map(|(_, line)| line)
}

/// Reply count read from the span that follows the comment icon.
///
/// The icon is searched in the title's container first, then in the whole
/// card. Text that is not one to three digits after normalisation counts as
/// zero.
#[must_use]
pub fn reply_count(card: &NodeRef, title: Option<&NodeRef>, max: u32) -> u32 {
    let title_scope = title
        .and_then(|t| t.parent())
        .and_then(|p| dom::closest(&p, CARD_TAGS));

    let counter = title_scope
        .and_then(|scope| comment_counter(&scope))
        .or_else(|| comment_counter(card));

    counter
        .map(|span| to_ascii_digits(dom::trimmed_text(&span).as_str()))
        .filter(|digits| REPLY_COUNT.is_match(digits))
        .and_then(|digits| digits.parse::<u32>().ok())
        .map_or(0, |n| n.min(max))
}

/// Span immediately after the first comment icon that has one.
fn comment_counter<'a>(scope: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    let mut icons = dom::find_by_attribute(scope, "svg", "data-icon", |v| v == COMMENT_ICON);
    icons.extend(
        dom::find_by_attribute(scope, "svg", "class", |_| true)
            .into_iter()
            .filter(|svg| dom::has_classes(svg, &[COMMENT_ICON_CLASS])),
    );

    icons.iter().find_map(|icon| {
        dom::next_element_sibling(icon).filter(|s| dom::node_tag(s).as_deref() == Some("span"))
    })
}
