//! Block signature detection
//!
//! A fetched page is either clean or challenged. Challenges are recognized by
//! known phrases in the title or visible text and, for lightweight requests,
//! by the status codes anti-bot layers answer with.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::SiteProfile;
use crate::utils::{collapse_whitespace, strip_html};

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>")
        .expect("BUG: hardcoded title regex is invalid - this is a compile-time bug")
});

/// Statuses treated as a block on lightweight fetches
pub const BLOCK_STATUSES: [u16; 2] = [403, 503];

/// Result of inspecting one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockVerdict {
    Clean,
    Challenged { reason: String },
}

impl BlockVerdict {
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Challenged { .. })
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Clean => None,
            Self::Challenged { reason } => Some(reason),
        }
    }
}

/// Title text of an HTML document, entity-decoded
#[must_use]
pub fn html_title(html: &str) -> String {
    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| collapse_whitespace(&html_escape::decode_html_entities(m.as_str())))
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct BlockDetector {
    phrases: Vec<String>,
}

impl BlockDetector {
    #[must_use]
    pub fn new(profile: &SiteProfile) -> Self {
        Self::with_phrases(&profile.block_phrases)
    }

    #[must_use]
    pub fn with_phrases(phrases: &[String]) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Check title and visible text for block phrases
    ///
    /// `title` is read from the markup when not supplied.
    #[must_use]
    pub fn inspect(&self, title: Option<&str>, html: &str) -> BlockVerdict {
        let title = title.map_or_else(|| html_title(html), ToString::to_string).to_lowercase();
        if let Some(phrase) = self.phrases.iter().find(|p| title.contains(p.as_str())) {
            return BlockVerdict::Challenged {
                reason: format!("title contains '{phrase}'"),
            };
        }

        let text = strip_html(html).to_lowercase();
        match self.phrases.iter().find(|p| text.contains(p.as_str())) {
            Some(phrase) => BlockVerdict::Challenged {
                reason: format!("page text contains '{phrase}'"),
            },
            None => BlockVerdict::Clean,
        }
    }

    /// Lightweight fetch check: block statuses first, then content
    #[must_use]
    pub fn inspect_http(&self, status: u16, html: &str) -> BlockVerdict {
        if BLOCK_STATUSES.contains(&status) {
            return BlockVerdict::Challenged {
                reason: format!("HTTP status {status}"),
            };
        }
        self.inspect(None, html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> BlockDetector {
        BlockDetector::new(&SiteProfile::default())
    }

    #[test]
    fn clean_listing_passes() {
        let html = "<html><head><title>Rust jobs in Berlin</title></head><body><h2>Engineer</h2></body></html>";
        assert_eq!(detector().inspect(None, html), BlockVerdict::Clean);
        assert_eq!(detector().inspect_http(200, html), BlockVerdict::Clean);
    }

    #[test]
    fn phrase_in_title_is_case_insensitive() {
        let html = "<title>Just a moment...</title><body></body>";
        assert!(detector().inspect(None, html).is_blocked());
    }

    #[test]
    fn phrase_in_body_text() {
        let html = "<title>jobs</title><body><div>Please Verify you\n   are human</div></body>";
        let verdict = detector().inspect(None, html);
        assert_eq!(verdict.reason(), Some("page text contains 'verify you are human'"));
    }

    #[test]
    fn phrases_inside_scripts_are_ignored() {
        let html = "<title>jobs</title><script>const msg = 'access denied';</script><p>ok</p>";
        assert!(!detector().inspect(None, html).is_blocked());
    }

    #[test]
    fn block_statuses_on_http() {
        let verdict = detector().inspect_http(403, "<html></html>");
        assert_eq!(verdict.reason(), Some("HTTP status 403"));
        assert!(detector().inspect_http(503, "").is_blocked());
        assert!(!detector().inspect_http(404, "<title>Not found</title>").is_blocked());
    }
}
