//! Candidate discovery and card grouping.
//!
//! Discovery is an ordered list of strategies. Each strategy is a pure
//! function from the page root to candidate elements; the first strategy that
//! yields anything wins and the rest are not consulted.

use std::collections::HashSet;

use dom_query::NodeId;
use tracing::debug;

use super::PageContext;
use crate::dom::{self, NodeRef};
use crate::patterns::{ANCHOR_SELECTOR, CARD_TAGS, TITLE_SPAN_SELECTOR};

/// A discovery strategy: returns candidate elements in document order.
pub type Strategy = for<'a> fn(&NodeRef<'a>, &PageContext) -> Vec<NodeRef<'a>>;

/// Strategies in the order they are tried.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("ad-links", ad_link_anchors),
    ("title-spans", title_spans),
];

/// Anchors whose href satisfies the ad-link test.
#[must_use]
pub fn ad_link_anchors<'a>(root: &NodeRef<'a>, ctx: &PageContext) -> Vec<NodeRef<'a>> {
    dom::select_all(root, ANCHOR_SELECTOR)
        .into_iter()
        .filter(|a| dom::attribute(a, "href").is_some_and(|href| ctx.is_ad_link(&href)))
        .collect()
}

/// Ellipsis-truncated title spans, for layouts where no anchor wraps the title.
#[must_use]
pub fn title_spans<'a>(root: &NodeRef<'a>, _ctx: &PageContext) -> Vec<NodeRef<'a>> {
    dom::select_all(root, TITLE_SPAN_SELECTOR)
}

/// Nearest container of each candidate, deduplicated, in first-seen order.
#[must_use]
pub fn group_cards<'a>(candidates: &[NodeRef<'a>]) -> Vec<NodeRef<'a>> {
    let mut seen: HashSet<NodeId> = HashSet::with_capacity(candidates.len());
    let mut cards: Vec<NodeRef<'a>> = Vec::new();
    for candidate in candidates {
        if let Some(card) = dom::closest(candidate, CARD_TAGS) {
            if seen.insert(card.id) {
                cards.push(card);
            }
        }
    }
    cards
}

/// Run the strategies in order and group the first non-empty result into cards.
#[must_use]
pub fn discover_cards<'a>(root: &NodeRef<'a>, ctx: &PageContext) -> Vec<NodeRef<'a>> {
    for (name, strategy) in STRATEGIES {
        let candidates = strategy(root, ctx);
        if candidates.is_empty() {
            continue;
        }
        let cards = group_cards(&candidates);
        debug!(strategy = *name, candidates = candidates.len(), cards = cards.len(), "discovered cards");
        return cards;
    }
    debug!("no ad candidates found");
    Vec::new()
}
