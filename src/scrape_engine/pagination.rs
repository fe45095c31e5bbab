//! Pagination
//!
//! A listing is paged either by a page-number query parameter (when the start
//! URL carries one) or by following the listing's own "next" control.

use anyhow::Result;
use scraper::{ElementRef, Html, Selector};

use crate::config::SiteProfile;
use crate::extraction::lookup::compile_selectors;
use crate::utils::{absolutize, page_number, with_page_number};

/// How the next listing page is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Increment `param` on `template`
    PageParam { template: String, param: String, first: u32 },
    /// Follow the "next" control found on each page
    FollowLinks,
}

impl PageCursor {
    #[must_use]
    pub fn for_start_url(start_url: &str, profile: &SiteProfile) -> Self {
        match page_number(start_url, &profile.page_param) {
            Some(first) => Self::PageParam {
                template: start_url.to_string(),
                param: profile.page_param.clone(),
                first,
            },
            None => Self::FollowLinks,
        }
    }

    /// URL of the page `offset` steps after the first one
    ///
    /// `None` in follow mode, and in page-param mode once the page number
    /// would overflow, which ends pagination.
    pub fn page_url(&self, offset: u32) -> Result<Option<String>> {
        match self {
            Self::PageParam {
                template,
                param,
                first,
            } => match first.checked_add(offset) {
                Some(page) => Ok(Some(with_page_number(template, param, page)?)),
                None => Ok(None),
            },
            Self::FollowLinks => Ok(None),
        }
    }

    #[must_use]
    pub fn is_page_param(&self) -> bool {
        matches!(self, Self::PageParam { .. })
    }
}

/// Next-page control state found in a page's markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// An enabled control exists; `href` is its absolute target when it is a link
    Enabled { href: Option<String> },
    /// Controls exist but all are disabled
    Disabled,
    /// No control at all
    Absent,
}

impl NextPage {
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        match self {
            Self::Enabled { href } => href.as_deref(),
            Self::Disabled | Self::Absent => None,
        }
    }
}

/// Finds next-page controls with the profile's ordered selectors
#[derive(Debug, Clone)]
pub struct NextPageProbe {
    selectors: Vec<Selector>,
}

impl NextPageProbe {
    #[must_use]
    pub fn new(profile: &SiteProfile) -> Self {
        let mut selectors = vec!["link[rel='next']".to_string()];
        selectors.extend(profile.next_page_selectors.iter().cloned());
        Self {
            selectors: compile_selectors(&selectors),
        }
    }

    #[must_use]
    pub fn probe(&self, html: &str, base_url: &str) -> NextPage {
        let document = Html::parse_document(html);
        let mut saw_disabled = false;

        for selector in &self.selectors {
            for element in document.select(selector) {
                if !is_enabled(element) {
                    saw_disabled = true;
                    continue;
                }
                let href = element
                    .value()
                    .attr("href")
                    .and_then(|href| absolutize(base_url, href));
                return NextPage::Enabled { href };
            }
        }

        if saw_disabled {
            NextPage::Disabled
        } else {
            NextPage::Absent
        }
    }
}

fn is_enabled(element: ElementRef<'_>) -> bool {
    let el = element.value();
    if el.attr("disabled").is_some() {
        return false;
    }
    if el
        .attr("aria-disabled")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        return false;
    }
    !el.classes().any(|c| c.to_ascii_lowercase().contains("disabled"))
}
