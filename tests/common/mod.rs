//! Test utilities and fake collaborators for the jobscrape test suite

use anyhow::Result;
use async_trait::async_trait;
use kodegen_tools_jobscrape::browser::{BrowserDriver, BrowserLauncher, BrowserVisit, VisitOutcome};
use kodegen_tools_jobscrape::extraction::InterceptedResponse;
use kodegen_tools_jobscrape::fetch::{HttpFetcher, HttpPage, SessionState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const START_URL: &str = "https://jobs.test/search?q=rust&page=1";

/// Search URL for a 1-based page number
#[allow(dead_code)]
pub fn page_url(page: u32) -> String {
    format!("https://jobs.test/search?q=rust&page={page}")
}

/// Detail URL for a job id, as the listing helpers link it
#[allow(dead_code)]
pub fn job_url(id: &str) -> String {
    format!("https://jobs.test/job/{id}")
}

/// Listing page with one DOM card per `(id, title)`
#[allow(dead_code)]
pub fn card_page(jobs: &[(&str, &str)], next_href: Option<&str>) -> String {
    let cards: String = jobs
        .iter()
        .map(|(id, title)| {
            format!(
                r#"<article class="job-card">
                     <h2 class="job-title"><a href="/job/{id}">{title}</a></h2>
                     <span class="company">Acme</span>
                     <span class="location">Remote</span>
                     <p class="snippet">Snippet for {title}</p>
                   </article>"#
            )
        })
        .collect();
    let next = next_href
        .map(|href| format!(r#"<nav><a rel="next" href="{href}">Next</a></nav>"#))
        .unwrap_or_default();
    format!("<html><head><title>Jobs</title></head><body>{cards}{next}</body></html>")
}

/// Listing page carrying jobs only in a hydration script
#[allow(dead_code)]
pub fn hydration_page(jobs: &[(&str, &str)]) -> String {
    let items: Vec<serde_json::Value> = jobs
        .iter()
        .map(|(id, title)| {
            serde_json::json!({
                "id": id,
                "title": title,
                "company": {"name": "Hydrated Co"},
                "url": format!("/job/{id}"),
            })
        })
        .collect();
    let state = serde_json::json!({"props": {"pageProps": {"jobs": items}}});
    format!(
        r#"<html><head><script id="__NEXT_DATA__" type="application/json">{state}</script></head><body></body></html>"#
    )
}

#[allow(dead_code)]
pub fn empty_page() -> String {
    "<html><head><title>Jobs</title></head><body><p>No results</p></body></html>".to_string()
}

#[allow(dead_code)]
pub fn challenge_page() -> String {
    "<html><head><title>Just a moment...</title></head><body>Checking your browser</body></html>"
        .to_string()
}

/// Scripted lightweight fetcher; unknown URLs fail like an unreachable host
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, (u16, String)>,
    requests: Mutex<Vec<(String, SessionState)>>,
}

#[allow(dead_code)]
impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), (status, body.into()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn session_for(&self, url: &str) -> Option<SessionState> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, session)| session.clone())
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl HttpFetcher for FakeFetcher {
    async fn get(&self, url: &str, session: &SessionState) -> Result<HttpPage> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), session.clone()));
        match self.pages.get(url) {
            Some((status, body)) => Ok(HttpPage {
                status: *status,
                final_url: url.to_string(),
                body: body.clone(),
            }),
            None => Err(anyhow::anyhow!("connection refused: {url}")),
        }
    }
}

/// One scripted browser page
#[derive(Clone)]
pub enum FakeVisit {
    Page {
        html: String,
        intercepted: Vec<InterceptedResponse>,
        outcome: VisitOutcome,
    },
    Fail(String),
}

#[allow(dead_code)]
impl FakeVisit {
    pub fn clean(html: impl Into<String>) -> Self {
        Self::Page {
            html: html.into(),
            intercepted: Vec::new(),
            outcome: VisitOutcome::Clean { bypass_rounds: 0 },
        }
    }

    pub fn with_traffic(html: impl Into<String>, intercepted: Vec<InterceptedResponse>) -> Self {
        Self::Page {
            html: html.into(),
            intercepted,
            outcome: VisitOutcome::Clean { bypass_rounds: 0 },
        }
    }

    pub fn blocked(rounds: u32) -> Self {
        Self::Page {
            html: challenge_page(),
            intercepted: Vec::new(),
            outcome: VisitOutcome::Blocked {
                bypass_rounds: rounds,
                reason: "title contains 'just a moment'".to_string(),
            },
        }
    }
}

/// Scripted browser session; unknown URLs render an empty listing
#[derive(Default)]
pub struct FakeDriver {
    pages: HashMap<String, FakeVisit>,
    visits: Mutex<Vec<String>>,
    shut_down: AtomicBool,
}

#[allow(dead_code)]
impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, visit: FakeVisit) -> Self {
        self.pages.insert(url.into(), visit);
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn was_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn visit(&self, url: &str) -> Result<BrowserVisit> {
        self.visits.lock().unwrap().push(url.to_string());
        let visit = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| FakeVisit::clean(empty_page()));

        match visit {
            FakeVisit::Fail(message) => Err(anyhow::anyhow!(message)),
            FakeVisit::Page {
                html,
                intercepted,
                outcome,
            } => Ok(BrowserVisit {
                requested_url: url.to_string(),
                final_url: url.to_string(),
                title: "Jobs".to_string(),
                screenshot: outcome.is_blocked().then(|| vec![0x89, b'P', b'N', b'G']),
                html,
                intercepted,
                outcome,
            }),
        }
    }

    async fn session_state(&self) -> SessionState {
        SessionState {
            cookies: vec![("cf_clearance".to_string(), "trusted".to_string())],
            user_agent: Some("FakeBrowser/1.0".to_string()),
        }
    }

    async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }
}

/// Hands out the same scripted driver on every launch
pub struct FakeLauncher {
    pub driver: Arc<FakeDriver>,
    launches: AtomicUsize,
    proxies: Mutex<Vec<Option<String>>>,
}

#[allow(dead_code)]
impl FakeLauncher {
    pub fn new(driver: FakeDriver) -> Self {
        Self {
            driver: Arc::new(driver),
            launches: AtomicUsize::new(0),
            proxies: Mutex::new(Vec::new()),
        }
    }

    /// Launcher whose driver has nothing scripted
    pub fn unused() -> Self {
        Self::new(FakeDriver::new())
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn proxies(&self) -> Vec<Option<String>> {
        self.proxies.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, proxy_url: Option<String>) -> Result<Arc<dyn BrowserDriver>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.proxies.lock().unwrap().push(proxy_url);
        Ok(self.driver.clone())
    }
}

/// Intercepted search API response carrying `(id, title)` jobs under `data.jobs`
#[allow(dead_code)]
pub fn api_response(jobs: &[(&str, &str)]) -> InterceptedResponse {
    let items: Vec<serde_json::Value> = jobs
        .iter()
        .map(|(id, title)| {
            serde_json::json!({
                "jobId": id,
                "jobTitle": title,
                "companyName": "Api Corp",
                "jobUrl": format!("https://jobs.test/job/{id}"),
            })
        })
        .collect();
    InterceptedResponse {
        url: "https://jobs.test/api/jobs/search?q=rust".to_string(),
        content_type: Some("application/json".to_string()),
        body: serde_json::json!({"data": {"jobs": items}}).to_string(),
    }
}
