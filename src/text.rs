//! Text and locale utilities.
//!
//! Listing pages mix Arabic-Indic, Extended Arabic-Indic and ASCII digits and
//! sort descriptions with Arabic collation, so these helpers sit under both
//! the extractor and the store ranking.

use std::cmp::Ordering;
use std::sync::LazyLock;

use icu_collator::options::CollatorOptions;
use icu_collator::{Collator, CollatorBorrowed};
use icu_locale_core::locale;

use crate::patterns::SEPARATOR_ONLY;

/// Ellipsis appended to truncated strings.
pub const ELLIPSIS: char = '…';

/// Maps Arabic-Indic (U+0660..U+0669) and Extended Arabic-Indic
/// (U+06F0..U+06F9) digits to ASCII. Other characters pass through.
#[must_use]
pub fn to_ascii_digits(s: &str) -> String {
    s.chars().map(ascii_digit).collect()
}

fn ascii_digit(c: char) -> char {
    let base = match c {
        '\u{0660}'..='\u{0669}' => 0x0660,
        '\u{06F0}'..='\u{06F9}' => 0x06F0,
        _ => return c,
    };
    char::from_digit(c as u32 - base, 10).unwrap_or(c)
}

/// True when the string contains at least one character of the Arabic block.
#[must_use]
pub fn is_arabic(s: &str) -> bool {
    s.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c))
}

/// Truncates to at most `max_chars` characters, replacing the tail with an
/// ellipsis when anything was cut.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

/// True for strings built only from separator punctuation (`.`, `•`, `·`, `|`).
#[must_use]
pub fn is_separator_only(s: &str) -> bool {
    SEPARATOR_ONLY.is_match(s)
}

/// Arabic (`ar`) collator from the compiled CLDR data.
#[allow(clippy::expect_used)]
static ARABIC_COLLATOR: LazyLock<CollatorBorrowed<'static>> = LazyLock::new(|| {
    Collator::try_new(locale!("ar").into(), CollatorOptions::default())
        .expect("compiled collation data for ar")
});

/// Compares two strings under Arabic collation.
///
/// Strings the collator considers equal fall back to code-point order so the
/// result is total.
#[must_use]
pub fn compare_locale(a: &str, b: &str) -> Ordering {
    ARABIC_COLLATOR.compare(a, b).then_with(|| a.cmp(b))
}
