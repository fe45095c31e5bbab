//! Text cleanup helpers shared by extractors and the normalizer
//!
//! Description text is always derived from description HTML through
//! [`strip_html`]; no source supplies it directly.

use regex::Regex;
use std::sync::LazyLock;

static BLOCK_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(script|style|noscript)[^>]*>[\s\S]*?<\s*/\s*(script|style|noscript)\s*>")
        .expect("BUG: hardcoded block tag regex is invalid - this is a compile-time bug")
});

static TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^>]*>").expect("BUG: hardcoded tag regex is invalid - this is a compile-time bug")
});

/// Strip markup and collapse whitespace.
///
/// Script, style and noscript bodies are removed entirely, remaining tags
/// become word separators, HTML entities are decoded, and all whitespace runs
/// collapse to single spaces.
///
/// # Examples
/// ```
/// # use kodegen_tools_jobscrape::utils::string_utils::strip_html;
/// assert_eq!(strip_html("<p>Hello <b>World</b></p>"), "Hello World");
/// assert_eq!(strip_html("Fish &amp; Chips"), "Fish & Chips");
/// ```
#[must_use]
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let without_blocks = BLOCK_TAGS.replace_all(html, " ");
    let without_tags = TAGS.replace_all(&without_blocks, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    collapse_whitespace(&decoded)
}

/// Collapse every whitespace run to a single space and trim the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Return `Some(trimmed)` when the text has any non-whitespace content.
#[must_use]
pub fn non_empty(text: &str) -> Option<String> {
    let cleaned = collapse_whitespace(text);
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_nested_markup() {
        assert_eq!(strip_html("<p>Hello <b>World</b></p>"), "Hello World");
    }

    #[test]
    fn drops_script_and_style_bodies() {
        let html = "<div>Role<script>var x = '<b>';</script><style>.a{}</style> details</div>";
        assert_eq!(strip_html(html), "Role details");
    }

    #[test]
    fn block_elements_become_separators() {
        assert_eq!(strip_html("<li>Rust</li><li>Tokio</li>"), "Rust Tokio");
    }

    #[test]
    fn decodes_entities_after_stripping() {
        assert_eq!(strip_html("<p>R&amp;D &lt;team&gt;</p>"), "R&D <team>");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(strip_html(""), "");
        assert_eq!(strip_html("<br/>  <hr>"), "");
    }

    #[test]
    fn non_empty_filters_whitespace() {
        assert_eq!(non_empty("  \n\t "), None);
        assert_eq!(non_empty("  a  b "), Some("a b".to_string()));
    }
}
