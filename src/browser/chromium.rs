//! chromiumoxide implementation of the browser seams
//!
//! A visit opens a blank page, injects stealth, subscribes to network
//! responses, navigates, and then drains every response event queued on the
//! subscription once the page has settled. Challenged pages go through the bypass
//! loop; pages that stay blocked get a screenshot for diagnostics.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::input::{DispatchMouseEventParams, DispatchMouseEventType};
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, GetResponseBodyParams, RequestId};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use futures::{FutureExt, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::driver::{BrowserDriver, BrowserLauncher, BrowserVisit, VisitOutcome};
use super::setup::{BrowserWrapper, LaunchOptions, launch_browser};
use crate::antibot::{BlockDetector, BypassOutcome, BypassPolicy, ChallengePage, StealthProfile, run_bypass, stealth};
use crate::config::ScrapeConfig;
use crate::extraction::InterceptedResponse;
use crate::fetch::SessionState;
use crate::scrape_engine::page_timeout::with_page_timeout;

/// Quiet period after load for late XHR/fetch calls to land
const SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// Browser behavior derived from the run configuration
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub headless: bool,
    pub page_load_timeout_secs: u64,
    pub navigation_timeout_secs: u64,
    pub bypass: BypassPolicy,
    pub block_phrases: Vec<String>,
    pub stealth: StealthProfile,
}

impl ChromiumOptions {
    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        let profile = config.site_profile();
        Self {
            headless: config.headless(),
            page_load_timeout_secs: config.page_load_timeout_secs(),
            navigation_timeout_secs: config.navigation_timeout_secs(),
            bypass: BypassPolicy::new(
                config.bypass_attempts(),
                profile.challenge_widget_selectors.clone(),
            ),
            block_phrases: profile.block_phrases.clone(),
            stealth: StealthProfile::default(),
        }
    }
}

/// Response metadata captured from `Network.responseReceived`
#[derive(Debug)]
struct ObservedResponse {
    request_id: RequestId,
    url: String,
    content_type: String,
}

impl ObservedResponse {
    /// `None` for non-JSON responses
    fn from_event(event: &EventResponseReceived) -> Option<Self> {
        let content_type = event.response.mime_type.to_lowercase();
        content_type.contains("json").then(|| Self {
            request_id: event.request_id.clone(),
            url: event.response.url.clone(),
            content_type,
        })
    }
}

/// Take every item already queued on `stream` without waiting for more
fn drain_ready<S: Stream + Unpin>(stream: &mut S) -> Vec<S::Item> {
    let mut ready = Vec::new();
    while let Some(Some(item)) = stream.next().now_or_never() {
        ready.push(item);
    }
    ready
}

/// Bypass-loop view of a live page
struct LivePage<'a> {
    page: &'a Page,
}

#[async_trait]
impl ChallengePage for LivePage<'_> {
    async fn snapshot(&self) -> Result<(String, String)> {
        let title = self.page.get_title().await?.unwrap_or_default();
        let html = self.page.content().await?;
        Ok((title, html))
    }

    async fn move_pointer(&self, x: f64, y: f64) -> Result<()> {
        self.page
            .execute(DispatchMouseEventParams::new(
                DispatchMouseEventType::MouseMoved,
                x,
                y,
            ))
            .await?;
        Ok(())
    }

    async fn click_first(&self, selectors: &[String]) -> Result<bool> {
        for selector in selectors {
            if let Ok(element) = self.page.find_element(selector.as_str()).await {
                element
                    .click()
                    .await
                    .with_context(|| format!("Failed to click challenge widget {selector}"))?;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

pub struct ChromiumDriver {
    wrapper: RwLock<Option<BrowserWrapper>>,
    options: ChromiumOptions,
    detector: BlockDetector,
    session: RwLock<SessionState>,
}

impl ChromiumDriver {
    #[must_use]
    pub fn new(wrapper: BrowserWrapper, options: ChromiumOptions) -> Self {
        let detector = BlockDetector::with_phrases(&options.block_phrases);
        let session = SessionState {
            cookies: Vec::new(),
            user_agent: Some(options.stealth.user_agent.clone()),
        };
        Self {
            wrapper: RwLock::new(Some(wrapper)),
            options,
            detector,
            session: RwLock::new(session),
        }
    }

    async fn blank_page(&self) -> Result<Page> {
        let guard = self.wrapper.read().await;
        let wrapper = guard
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Browser session already shut down"))?;
        wrapper
            .browser()
            .new_page("about:blank")
            .await
            .context("Failed to create blank page")
    }

    async fn navigate(&self, page: &Page, url: &str) -> Result<()> {
        with_page_timeout(
            async {
                page.goto(url)
                    .await
                    .with_context(|| format!("Failed to navigate to {url}"))?;
                Ok(())
            },
            self.options.page_load_timeout_secs,
            "Page load",
        )
        .await?;

        with_page_timeout(
            async {
                page.wait_for_navigation()
                    .await
                    .context("Failed to wait for navigation")?;
                Ok(())
            },
            self.options.navigation_timeout_secs,
            "Navigation",
        )
        .await
    }

    async fn response_bodies(page: &Page, observed: Vec<ObservedResponse>) -> Vec<InterceptedResponse> {
        let mut bodies = Vec::with_capacity(observed.len());
        for response in observed {
            match page
                .execute(GetResponseBodyParams::new(response.request_id.clone()))
                .await
            {
                Ok(reply) if !reply.result.base64_encoded => bodies.push(InterceptedResponse {
                    url: response.url,
                    content_type: Some(response.content_type),
                    body: reply.result.body.clone(),
                }),
                Ok(_) => debug!("Skipping base64-encoded body from {}", response.url),
                Err(e) => debug!("Response body for {} unavailable: {e}", response.url),
            }
        }
        bodies
    }

    async fn screenshot(page: &Page) -> Option<Vec<u8>> {
        let params = CaptureScreenshotParams {
            format: Some(CaptureScreenshotFormat::Png),
            ..Default::default()
        };
        match page.screenshot(params).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Failed to capture screenshot of blocked page: {e}");
                None
            }
        }
    }

    async fn remember_cookies(&self, page: &Page) {
        match page.get_cookies().await {
            Ok(cookies) => {
                let pairs = cookies.into_iter().map(|c| (c.name, c.value)).collect();
                self.session.write().await.cookies = pairs;
            }
            Err(e) => debug!("Could not read session cookies: {e}"),
        }
    }

    async fn visit_on(&self, page: &Page, url: &str) -> Result<BrowserVisit> {
        if let Err(e) = stealth::inject(page, &self.options.stealth).await {
            warn!("Stealth injection failed, continuing without it: {e:#}");
        }

        let mut events = page
            .event_listener::<EventResponseReceived>()
            .await
            .context("Failed to subscribe to network responses")?;

        self.navigate(page, url).await?;
        tokio::time::sleep(SETTLE_DELAY).await;

        let live = LivePage { page };
        let (mut title, mut html) = live.snapshot().await?;
        let mut outcome = VisitOutcome::Clean { bypass_rounds: 0 };

        if let Some(reason) = self.detector.inspect(Some(&title), &html).reason() {
            info!("Challenge detected on {url}: {reason}");
            match run_bypass(&live, &self.detector, &self.options.bypass, reason).await {
                BypassOutcome::Cleared { rounds } => {
                    tokio::time::sleep(SETTLE_DELAY).await;
                    (title, html) = live.snapshot().await?;
                    outcome = VisitOutcome::Clean { bypass_rounds: rounds };
                }
                BypassOutcome::StillBlocked { rounds, reason } => {
                    outcome = VisitOutcome::Blocked {
                        bypass_rounds: rounds,
                        reason,
                    };
                }
            }
        }

        let observed: Vec<ObservedResponse> = drain_ready(&mut events)
            .iter()
            .filter_map(|event| ObservedResponse::from_event(event))
            .collect();
        debug!("Observed {} JSON response(s) on {url}", observed.len());

        let (intercepted, screenshot) = if outcome.is_blocked() {
            (Vec::new(), Self::screenshot(page).await)
        } else {
            self.remember_cookies(page).await;
            (Self::response_bodies(page, observed).await, None)
        };

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(BrowserVisit {
            requested_url: url.to_string(),
            final_url,
            title,
            html,
            intercepted,
            outcome,
            screenshot,
        })
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn visit(&self, url: &str) -> Result<BrowserVisit> {
        let page = self.blank_page().await?;
        let result = self.visit_on(&page, url).await;
        if let Err(e) = page.close().await {
            debug!("Failed to close page for {url}: {e}");
        }
        result
    }

    async fn session_state(&self) -> SessionState {
        self.session.read().await.clone()
    }

    async fn shutdown(&self) {
        if let Some(wrapper) = self.wrapper.write().await.take() {
            info!("Shutting down browser session");
            wrapper.shutdown().await;
        }
    }
}

/// Launches chromiumoxide sessions
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    options: ChromiumOptions,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(options: ChromiumOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(ChromiumOptions::from_config(config))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, proxy_url: Option<String>) -> Result<Arc<dyn BrowserDriver>> {
        let wrapper = launch_browser(&LaunchOptions {
            headless: self.options.headless,
            proxy_url,
            request_timeout: Duration::from_secs(self.options.page_load_timeout_secs),
        })
        .await?;
        Ok(Arc::new(ChromiumDriver::new(wrapper, self.options.clone())))
    }
}
