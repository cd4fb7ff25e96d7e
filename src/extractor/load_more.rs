//! Detection of the "show more" control at the bottom of the listing.

use url::Url;

use crate::dom::{self, Document, NodeRef};
use crate::patterns::LOAD_MORE_LABEL;
use crate::url_utils::resolve;

/// Tags the clickable wrapper of the label may have.
const CONTROL_TAGS: &[&str] = &["button", "a", "div"];

/// A located "show more" control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMore {
    /// Tag of the clickable element.
    pub tag: String,
    /// Resolved target when the control is an anchor with an href.
    pub href: Option<Url>,
}

/// Find the "show more" control of a snapshot.
///
/// The label span is matched on its exact trimmed text; the control is its
/// nearest button, anchor or div ancestor.
#[must_use]
pub fn find_load_more(doc: &Document, base: &Url) -> Option<LoadMore> {
    let control = doc
        .select("span")
        .nodes()
        .iter()
        .find(|span| dom::trimmed_text(span) == LOAD_MORE_LABEL)
        .and_then(|span| span.parent())
        .and_then(|parent| dom::closest(&parent, CONTROL_TAGS))?;

    Some(LoadMore {
        tag: dom::node_tag(&control).unwrap_or_default(),
        href: anchor_target(&control, base),
    })
}

fn anchor_target(control: &NodeRef, base: &Url) -> Option<Url> {
    if dom::node_tag(control).as_deref() != Some("a") {
        return None;
    }
    dom::attribute(control, "href").and_then(|href| resolve(&href, base))
}
