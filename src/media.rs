//! Helpful utilities for working with media shortcodes.

use regex::Regex;
use std::sync::LazyLock;

static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)!\[\[media:[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}\]\]",
    )
    .expect("invalid media shortcode pattern")
});

/// Removes media shortcodes from Markdown source.
///
/// A media shortcode references an attachment by its UUID, as in
/// `![[media:5f0c8a4e-2b6d-4c1a-9e3f-7a8b9c0d1e2f]]`. The UUID must be a
/// version 4 UUID, in upper or lower case. Trailing whitespace is also
/// trimmed from the result.
///
/// # Examples
///
/// ```
/// use mdelta::media::strip_shortcodes;
/// let markup = "Look at this: ![[media:5f0c8a4e-2b6d-4c1a-9e3f-7a8b9c0d1e2f]]";
/// assert_eq!(strip_shortcodes(markup), "Look at this:");
/// ```
///
/// ```
/// use mdelta::media::strip_shortcodes;
/// let markup = "![[media:not-a-uuid]]";
/// assert_eq!(strip_shortcodes(markup), markup);
/// ```
pub fn strip_shortcodes(markup: &str) -> String {
    SHORTCODE_RE.replace_all(markup, "").trim_end().to_string()
}
