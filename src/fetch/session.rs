//! Browsing session state shared with lightweight requests
//!
//! Detail-page enrichment reuses the browser's cookies and user agent so the
//! requests inherit whatever trust the browser session established.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// `(name, value)` pairs in the order the browser reported them
    pub cookies: Vec<(String, String)>,
    pub user_agent: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.user_agent.is_none()
    }

    /// `Cookie` header value, `None` without cookies
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_joins_pairs() {
        let session = SessionState {
            cookies: vec![
                ("cf_clearance".to_string(), "abc".to_string()),
                ("sid".to_string(), "42".to_string()),
            ],
            user_agent: None,
        };
        assert_eq!(session.cookie_header().as_deref(), Some("cf_clearance=abc; sid=42"));
        assert_eq!(SessionState::default().cookie_header(), None);
        assert!(SessionState::default().is_empty());
    }
}
