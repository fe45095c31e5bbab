//! Browser retrieval seams
//!
//! The orchestrator only sees these traits. The chromiumoxide implementation
//! lives in [`super::chromium`]; tests substitute scripted fakes.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::extraction::InterceptedResponse;
use crate::fetch::SessionState;

/// How a browser visit ended with respect to anti-bot challenges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    /// Page content is usable. `bypass_rounds` is non-zero when a challenge was cleared.
    Clean { bypass_rounds: u32 },
    /// Challenge survived every bypass round; content must be discarded
    Blocked { bypass_rounds: u32, reason: String },
}

impl VisitOutcome {
    #[must_use]
    pub fn bypass_rounds(&self) -> u32 {
        match self {
            Self::Clean { bypass_rounds } | Self::Blocked { bypass_rounds, .. } => *bypass_rounds,
        }
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// Everything captured from one page visit
#[derive(Debug, Clone)]
pub struct BrowserVisit {
    pub requested_url: String,
    pub final_url: String,
    pub title: String,
    pub html: String,
    /// JSON responses observed while the page loaded, in arrival order
    pub intercepted: Vec<InterceptedResponse>,
    pub outcome: VisitOutcome,
    /// Visual snapshot, captured only for blocked visits
    pub screenshot: Option<Vec<u8>>,
}

/// A running browser session
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate a fresh page to `url`, handling challenges along the way
    ///
    /// Safe to call concurrently; each visit uses its own page.
    async fn visit(&self, url: &str) -> Result<BrowserVisit>;

    /// Cookies and user agent of the session, for lightweight follow-up requests
    async fn session_state(&self) -> SessionState;

    async fn shutdown(&self);
}

/// Starts a browser session on demand
///
/// Runs that never leave HTTP-first mode never launch a browser.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, proxy_url: Option<String>) -> Result<Arc<dyn BrowserDriver>>;
}
