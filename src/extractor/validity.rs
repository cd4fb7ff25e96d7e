//! Card validity filter.

use super::PageContext;
use crate::patterns::PLACEHOLDER_DESCRIPTION;
use crate::text::is_arabic;

/// Descriptions must be longer than this many characters.
const MIN_DESCRIPTION_CHARS: usize = 2;

/// True for the "create new ad" call-to-action text.
#[must_use]
pub fn is_placeholder(description: &str) -> bool {
    PLACEHOLDER_DESCRIPTION.is_match(description.trim())
}

/// Whether a card's description and link make it a real ad.
///
/// The description is checked before truncation.
#[must_use]
pub fn is_valid(description: &str, link: &str, ctx: &PageContext) -> bool {
    let description = description.trim();
    !link.is_empty()
        && ctx.is_ad_link(link)
        && description.chars().count() > MIN_DESCRIPTION_CHARS
        && is_arabic(description)
        && !is_placeholder(description)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PageContext {
        PageContext::new("https://haraj.com.sa/", "haraj.com.sa").expect("context")
    }

    const LINK: &str = "https://haraj.com.sa/12345678";

    #[test]
    fn accepts_arabic_description_with_ad_link() {
        assert!(is_valid("سيارة للبيع", LINK, &ctx()));
    }

    #[test]
    fn rejects_placeholders() {
        assert!(is_placeholder("إضافة عرض"));
        assert!(is_placeholder("  ADD AD "));
        assert!(!is_valid("إضافة عرض", LINK, &ctx()));
        assert!(!is_valid("أضف إعلان", LINK, &ctx()));
    }

    #[test]
    fn rejects_short_or_non_arabic_descriptions() {
        assert!(!is_valid("سي", LINK, &ctx()));
        assert!(!is_valid("Toyota Camry 2020", LINK, &ctx()));
        assert!(!is_valid("", LINK, &ctx()));
    }

    #[test]
    fn rejects_missing_or_foreign_links() {
        assert!(!is_valid("سيارة للبيع", "", &ctx()));
        assert!(!is_valid("سيارة للبيع", "https://other.example/12345678", &ctx()));
        assert!(!is_valid("سيارة للبيع", "https://haraj.com.sa/city/jeddah", &ctx()));
    }
}
