//! Diagnostics for offline triage
//!
//! Written through the sink on a best-effort basis; a failed write is logged
//! and never fails the page.

use log::{debug, warn};
use scraper::{Html, Selector};
use serde::Serialize;
use std::sync::LazyLock;

use super::stats::RetrievalMode;
use crate::config::SiteProfile;
use crate::sink::JobSink;

static ANY_ELEMENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("*").expect("BUG: hardcoded selector '*' is invalid"));
static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("BUG: hardcoded selector 'script' is invalid"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("BUG: hardcoded selector 'a[href]' is invalid"));
static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type='application/ld+json']")
        .expect("BUG: hardcoded JSON-LD selector is invalid")
});
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("BUG: hardcoded selector 'title' is invalid"));

/// Elements inspected for attribute samples
const SAMPLE_ELEMENTS: usize = 200;
const MAX_SAMPLES: usize = 25;

/// Structural overview of a page that yielded no candidates
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStructure {
    pub url: String,
    pub title: String,
    pub element_count: usize,
    pub script_count: usize,
    pub anchor_count: usize,
    pub json_ld_blocks: usize,
    pub has_hydration_script: bool,
    pub class_samples: Vec<String>,
    pub data_attribute_samples: Vec<String>,
}

impl PageStructure {
    #[must_use]
    pub fn summarize(url: &str, html: &str, profile: &SiteProfile) -> Self {
        let document = Html::parse_document(html);
        let has_hydration_script = Selector::parse(&profile.hydration_script_selector)
            .map(|sel| document.select(&sel).next().is_some())
            .unwrap_or(false);

        let mut class_samples = Vec::new();
        let mut data_attribute_samples = Vec::new();
        for element in document.select(&ANY_ELEMENT).take(SAMPLE_ELEMENTS) {
            let el = element.value();
            if class_samples.len() < MAX_SAMPLES {
                if let Some(class) = el.attr("class").map(str::trim).filter(|c| !c.is_empty()) {
                    let sample = format!("{}.{}", el.name(), class);
                    if !class_samples.contains(&sample) {
                        class_samples.push(sample);
                    }
                }
            }
            for (name, value) in el.attrs() {
                if data_attribute_samples.len() >= MAX_SAMPLES {
                    break;
                }
                if name.starts_with("data-") {
                    let sample = format!("{name}={value}");
                    if !data_attribute_samples.contains(&sample) {
                        data_attribute_samples.push(sample);
                    }
                }
            }
        }

        Self {
            url: url.to_string(),
            title: document
                .select(&TITLE)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
                .unwrap_or_default(),
            element_count: document.select(&ANY_ELEMENT).count(),
            script_count: document.select(&SCRIPT).count(),
            anchor_count: document.select(&ANCHOR).count(),
            json_ld_blocks: document.select(&LD_JSON).count(),
            has_hydration_script,
            class_samples,
            data_attribute_samples,
        }
    }
}

/// Key prefix for one page's diagnostics
fn key_prefix(kind: &str, mode: RetrievalMode, page: u32) -> String {
    format!("{kind}_{}_page_{page}", mode.label().to_uppercase())
}

async fn save(sink: &dyn JobSink, key: &str, bytes: &[u8], content_type: &str) {
    match sink.save_diagnostic(key, bytes, content_type).await {
        Ok(()) => debug!("Saved diagnostic {key}"),
        Err(e) => warn!("Failed to save diagnostic {key}: {e:#}"),
    }
}

/// Raw markup plus structure summary for a page where every strategy came up empty
pub async fn save_empty_page(
    sink: &dyn JobSink,
    mode: RetrievalMode,
    page: u32,
    url: &str,
    html: &str,
    profile: &SiteProfile,
) {
    let prefix = key_prefix("EMPTY", mode, page);
    save(sink, &format!("{prefix}.html"), html.as_bytes(), "text/html").await;

    let structure = PageStructure::summarize(url, html, profile);
    match serde_json::to_vec_pretty(&structure) {
        Ok(json) => {
            save(
                sink,
                &format!("{prefix}_structure.json"),
                &json,
                "application/json",
            )
            .await;
        }
        Err(e) => warn!("Failed to serialize page structure for {url}: {e}"),
    }
}

/// Markup and, in browser mode, a screenshot of a page that stayed blocked
pub async fn save_blocked_page(
    sink: &dyn JobSink,
    mode: RetrievalMode,
    page: u32,
    html: &str,
    screenshot: Option<&[u8]>,
) {
    let prefix = key_prefix("BLOCKED", mode, page);
    save(sink, &format!("{prefix}.html"), html.as_bytes(), "text/html").await;
    if let Some(png) = screenshot {
        save(sink, &format!("{prefix}.png"), png, "image/png").await;
    }
}
