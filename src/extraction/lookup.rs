//! Ordered fallback lookups
//!
//! Every "try these names in order" rule in extraction and normalization is an
//! explicit list evaluated front to back, first non-empty result wins. JSON
//! lookups are [`Lookup`] values (a dotted path plus a reader); markup lookups
//! are compiled selector lists.

use scraper::{ElementRef, Selector};
use serde_json::Value;
use tracing::warn;

use crate::utils::collapse_whitespace;

/// Turns the value found at a path into text
pub type Reader = fn(&Value) -> Option<String>;

/// One entry of an ordered lookup list
#[derive(Clone, Copy)]
pub struct Lookup {
    path: &'static str,
    read: Reader,
}

impl Lookup {
    /// Read a scalar (string or number) at `path`
    #[must_use]
    pub const fn text(path: &'static str) -> Self {
        Self {
            path,
            read: scalar_text,
        }
    }

    /// Read the value at `path` with a custom reader
    #[must_use]
    pub const fn with(path: &'static str, read: Reader) -> Self {
        Self { path, read }
    }

    #[must_use]
    pub fn apply(&self, value: &Value) -> Option<String> {
        value_at(value, self.path).and_then(self.read)
    }
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lookup").field("path", &self.path).finish()
    }
}

/// Evaluate lookups in order, returning the first non-empty result
#[must_use]
pub fn first_match(value: &Value, lookups: &[Lookup]) -> Option<String> {
    lookups.iter().find_map(|lookup| lookup.apply(value))
}

/// Resolve a dotted path; numeric segments index into arrays
///
/// An empty path returns the value itself.
#[must_use]
pub fn value_at<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Non-empty string or number as text
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let cleaned = collapse_whitespace(s);
            (!cleaned.is_empty()).then_some(cleaned)
        }
        Value::Number(n) => Some(format_number(n)),
        _ => None,
    }
}

/// Scalar text, or a comma-joined list of scalars
#[must_use]
pub fn text_or_list(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        other => scalar_text(other),
    }
}

/// Raw string without whitespace collapsing, for markup fields
#[must_use]
pub fn raw_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Integers print without a fractional part even when stored as floats
#[must_use]
pub fn format_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

/// Compile an ordered selector list, skipping (and logging) invalid entries
#[must_use]
pub fn compile_selectors(selectors: &[String]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|raw| match Selector::parse(raw) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!("Skipping invalid selector '{raw}': {e}");
                None
            }
        })
        .collect()
}

/// Text of the first selector match with non-empty content
#[must_use]
pub fn first_text(scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        scope
            .select(selector)
            .find_map(|el| crate::utils::non_empty(&el.text().collect::<String>()))
    })
}

/// First matching element in selector-list order
#[must_use]
pub fn first_element<'a>(scope: ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|selector| scope.select(selector).next())
}

/// `href` of the first matching element that has one
#[must_use]
pub fn first_href(scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        scope
            .select(selector)
            .find_map(|el| el.value().attr("href").map(str::trim).filter(|h| !h.is_empty()))
            .map(ToString::to_string)
    })
}
