//! Lightweight HTTP retrieval
//!
//! Not a browser: plain GET requests with browser-like headers. Retries 5xx
//! with exponential backoff and honors `Retry-After` on 429, but returns
//! 403/503 immediately since those are block signatures, not transient errors.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE as ACCEPT_LANGUAGE_HEADER, COOKIE, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};

use super::session::SessionState;
use crate::antibot::BLOCK_STATUSES;
use crate::utils::{ACCEPT_LANGUAGE, CHROME_USER_AGENT};

/// Upper bound for a server-requested `Retry-After` wait (seconds)
const MAX_RETRY_AFTER_SECS: u64 = 10;

const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Response of a lightweight GET
#[derive(Debug, Clone)]
pub struct HttpPage {
    pub status: u16,
    /// Final URL after redirects
    pub final_url: String,
    pub body: String,
}

/// Lightweight page retrieval
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GET `url`, sending the session's cookies and user agent when present
    ///
    /// Non-2xx statuses are returned as pages, not errors; only transport
    /// failures are errors.
    async fn get(&self, url: &str, session: &SessionState) -> Result<HttpPage>;
}

/// reqwest-backed fetcher
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_retries: u32,
    backoff_base: Duration,
}

impl ReqwestFetcher {
    /// # Arguments
    ///
    /// * `proxy_url` - outbound proxy for every request, if any
    /// * `timeout_ms` - per-request timeout
    pub fn new(proxy_url: Option<&str>, timeout_ms: u64) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5));

        if let Some(proxy) = proxy_url {
            builder = builder
                .proxy(reqwest::Proxy::all(proxy).with_context(|| format!("Invalid proxy URL: {proxy}"))?);
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            max_retries: 2,
            backoff_base: Duration::from_millis(500),
        })
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff_base = backoff_base;
        self
    }

    fn backoff(&self, retry: u32) -> Duration {
        self.backoff_base * 2u32.pow(retry.saturating_sub(1))
    }

    fn request(&self, url: &str, session: &SessionState) -> reqwest::RequestBuilder {
        let user_agent = session.user_agent.as_deref().unwrap_or(CHROME_USER_AGENT);
        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, HTML_ACCEPT)
            .header(ACCEPT_LANGUAGE_HEADER, ACCEPT_LANGUAGE);
        if let Some(cookies) = session.cookie_header() {
            request = request.header(COOKIE, cookies);
        }
        request
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str, session: &SessionState) -> Result<HttpPage> {
        let mut retries = 0u32;

        loop {
            match self.request(url, session).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if status >= 500 && !BLOCK_STATUSES.contains(&status) && retries < self.max_retries {
                        retries += 1;
                        let delay = self.backoff(retries);
                        debug!("HTTP {status} from {url}, retry {retries} in {delay:?}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status == 429 && retries < self.max_retries {
                        retries += 1;
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.trim().parse::<u64>().ok())
                            .unwrap_or(2);
                        let delay = Duration::from_secs(retry_after.min(MAX_RETRY_AFTER_SECS));
                        warn!("HTTP 429 from {url}, backing off {delay:?}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let final_url = response.url().to_string();
                    let body = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response body from {url}"))?;

                    return Ok(HttpPage {
                        status,
                        final_url,
                        body,
                    });
                }
                Err(e) => {
                    if retries < self.max_retries {
                        retries += 1;
                        let delay = self.backoff(retries);
                        debug!("Request to {url} failed ({e}), retry {retries} in {delay:?}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(anyhow::Error::new(e).context(format!("Network request to {url} failed")));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn fetcher() -> ReqwestFetcher {
        ReqwestFetcher::new(None, 5_000)
            .expect("client")
            .with_retries(2, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn sends_session_cookies_and_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_header("cookie", "cf_clearance=abc; sid=1")
            .match_header("user-agent", "TestAgent/1.0")
            .match_header("accept-language", Matcher::Regex("en-US".to_string()))
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let session = SessionState {
            cookies: vec![
                ("cf_clearance".to_string(), "abc".to_string()),
                ("sid".to_string(), "1".to_string()),
            ],
            user_agent: Some("TestAgent/1.0".to_string()),
        };
        let page = fetcher()
            .get(&format!("{}/search", server.url()), &session)
            .await
            .expect("page");

        mock.assert_async().await;
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let page = fetcher()
            .get(&format!("{}/flaky", server.url()), &SessionState::default())
            .await
            .expect("page");

        mock.assert_async().await;
        assert_eq!(page.status, 500);
    }

    #[tokio::test]
    async fn block_statuses_are_not_retried() {
        let mut server = Server::new_async().await;
        let forbidden = server
            .mock("GET", "/forbidden")
            .with_status(403)
            .expect(1)
            .create_async()
            .await;
        let unavailable = server
            .mock("GET", "/unavailable")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let f = fetcher();
        let a = f
            .get(&format!("{}/forbidden", server.url()), &SessionState::default())
            .await
            .expect("page");
        let b = f
            .get(&format!("{}/unavailable", server.url()), &SessionState::default())
            .await
            .expect("page");

        forbidden.assert_async().await;
        unavailable.assert_async().await;
        assert_eq!((a.status, b.status), (403, 503));
    }

    #[tokio::test]
    async fn too_many_requests_honors_retry_after() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/limited")
            .with_status(429)
            .with_header("retry-after", "0")
            .expect(3)
            .create_async()
            .await;

        let page = fetcher()
            .get(&format!("{}/limited", server.url()), &SessionState::default())
            .await
            .expect("page");

        limited.assert_async().await;
        assert_eq!(page.status, 429);
    }
}
