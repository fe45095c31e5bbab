//! Site-specific extraction data
//!
//! Everything here describes one site's current markup and API shapes: query
//! parameter names, selectors, JSON key paths, block phrases. None of it is
//! architecture. It is expected to drift as the site changes, so it lives in
//! data that the input can partially override (`siteProfile`) instead of
//! being baked into the extractors.
//!
//! Every list is ordered: extractors take the first entry that yields a result.

use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteProfile {
    pub search_base_url: String,
    pub keyword_param: String,
    pub location_param: String,
    pub page_param: String,
    pub sort_param: String,
    pub sort_code_date: String,
    pub sort_code_relevance: String,

    /// Detail URL for items that only carry an id, `{id}` is substituted
    pub job_url_template: Option<String>,

    /// Regexes matched against link paths that point at a posting's detail page
    pub detail_path_patterns: Vec<String>,

    /// Substrings identifying search/query endpoints among intercepted responses
    pub api_url_hints: Vec<String>,

    /// Dotted key paths tried, in order, to find the job array in an API response
    pub api_envelope_keys: Vec<String>,

    pub hydration_script_selector: String,

    /// Dotted key paths tried, in order, inside the hydration state
    pub hydration_key_paths: Vec<String>,

    /// Depth limit for the structural walk over hydration state
    pub hydration_max_depth: usize,

    pub card_selectors: Vec<String>,
    pub title_selectors: Vec<String>,
    pub company_selectors: Vec<String>,
    pub location_selectors: Vec<String>,
    pub salary_selectors: Vec<String>,
    pub snippet_selectors: Vec<String>,
    pub posted_date_selectors: Vec<String>,
    pub link_selectors: Vec<String>,

    /// Enabled "next page" controls, used by both retrieval modes
    pub next_page_selectors: Vec<String>,

    /// Lowercase phrases whose presence in title or body marks a challenge page
    pub block_phrases: Vec<String>,

    /// Challenge widgets a bypass round tries to click
    pub challenge_widget_selectors: Vec<String>,

    pub detail_description_selectors: Vec<String>,
    pub detail_job_type_selectors: Vec<String>,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            search_base_url: "https://jobs.example.com/search".to_string(),
            keyword_param: "q".to_string(),
            location_param: "l".to_string(),
            page_param: "page".to_string(),
            sort_param: "sort".to_string(),
            sort_code_date: "date".to_string(),
            sort_code_relevance: "relevance".to_string(),
            job_url_template: None,
            detail_path_patterns: strings(&[
                r"/jobs?/view/",
                r"/viewjob",
                r"/job-listing/",
                r"/jobs?/[^/?#]*\d[^/?#]*/?$",
                r"/job/[^/?#]+",
            ]),
            api_url_hints: strings(&["search", "query", "graphql", "/api/jobs"]),
            api_envelope_keys: strings(&[
                "jobs",
                "results",
                "data.jobs",
                "data.search.jobs",
                "data.jobSearch.results",
                "hits",
                "items",
                "jobListings",
                "searchResults.jobs",
            ]),
            hydration_script_selector: "script#__NEXT_DATA__".to_string(),
            hydration_key_paths: strings(&[
                "props.pageProps.jobs",
                "props.pageProps.searchResults.jobs",
                "props.pageProps.initialState.jobs.list",
                "props.pageProps.data.jobs",
                "props.pageProps.jobListings",
            ]),
            hydration_max_depth: 12,
            card_selectors: strings(&[
                "[data-testid='job-card']",
                "article.job-card",
                "li.job-result",
                "div.job_seen_beacon",
                "[data-job-id]",
                ".job-listing",
            ]),
            title_selectors: strings(&[
                "[data-testid='job-title']",
                "h2.job-title",
                "h2 a",
                "h3 a",
                ".title",
                "h2",
                "h3",
            ]),
            company_selectors: strings(&[
                "[data-testid='company-name']",
                ".company-name",
                ".company",
                "[itemprop='hiringOrganization']",
            ]),
            location_selectors: strings(&[
                "[data-testid='job-location']",
                ".job-location",
                ".location",
                "[itemprop='jobLocation']",
            ]),
            salary_selectors: strings(&[
                "[data-testid='job-salary']",
                ".salary-snippet",
                ".salary",
                ".compensation",
            ]),
            snippet_selectors: strings(&[
                "[data-testid='job-snippet']",
                ".job-snippet",
                ".snippet",
                ".description",
                "p",
            ]),
            posted_date_selectors: strings(&[
                "[data-testid='posted-date']",
                "time",
                ".date",
                ".posted",
            ]),
            link_selectors: strings(&[
                "a[data-testid='job-link']",
                "h2 a[href]",
                "h3 a[href]",
                "a[href]",
            ]),
            next_page_selectors: strings(&[
                "a[rel='next']",
                "a[data-testid='pagination-page-next']",
                "a[aria-label='Next Page']",
                "a[aria-label='Next']",
                "button[aria-label='Next']",
                ".pagination .next a",
            ]),
            block_phrases: strings(&[
                "just a moment",
                "verify you are human",
                "are you a robot",
                "access denied",
                "unusual traffic",
                "checking your browser",
                "please enable cookies",
                "request blocked",
                "additional verification required",
            ]),
            challenge_widget_selectors: strings(&[
                "input[type='checkbox']",
                "#challenge-stage input",
                ".cf-turnstile",
                "#px-captcha",
                "button#verify",
            ]),
            detail_description_selectors: strings(&[
                "[data-testid='job-description']",
                "#jobDescriptionText",
                ".job-description",
                "[itemprop='description']",
                "article",
            ]),
            detail_job_type_selectors: strings(&[
                "[data-testid='job-type']",
                ".job-type",
                "[itemprop='employmentType']",
            ]),
        }
    }
}
