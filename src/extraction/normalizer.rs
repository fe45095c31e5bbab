//! Normalizer
//!
//! Maps heterogeneous candidates onto [`JobRecord`]. Field names differ by
//! source, so each extraction method has its own ordered lookup table; the
//! readers (location coalescing, salary ranges) are shared.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::lookup::{Lookup, first_match, format_number, raw_string, scalar_text, text_or_list, value_at};
use super::schema::{ExtractionMethod, JobRecord, RawJobCandidate};
use crate::utils::{NOT_SPECIFIED, absolutize, strip_html};

/// Ordered lookups for every canonical field of one source type
struct FieldTable {
    title: &'static [Lookup],
    company: &'static [Lookup],
    location: &'static [Lookup],
    salary: &'static [Lookup],
    job_type: &'static [Lookup],
    posted_date: &'static [Lookup],
    description: &'static [Lookup],
    url: &'static [Lookup],
    id: &'static [Lookup],
}

/// API payloads and hydration items share the same loose vocabulary
const PAYLOAD_FIELDS: FieldTable = FieldTable {
    title: &[
        Lookup::text("title"),
        Lookup::text("jobTitle"),
        Lookup::text("positionTitle"),
        Lookup::text("displayTitle"),
        Lookup::text("job.title"),
        Lookup::text("name"),
    ],
    company: &[
        Lookup::text("company"),
        Lookup::text("companyName"),
        Lookup::text("company.name"),
        Lookup::text("company.displayName"),
        Lookup::text("employer.name"),
        Lookup::text("employerName"),
        Lookup::text("hiringOrganization.name"),
        Lookup::text("hiringOrganization"),
    ],
    location: &[
        Lookup::with("formattedLocation", location_text),
        Lookup::with("location", location_text),
        Lookup::with("jobLocation", location_text),
        Lookup::with("locations", location_text),
        Lookup::with("address", location_text),
    ],
    salary: &[
        Lookup::with("salary", salary_text),
        Lookup::with("salaryText", salary_text),
        Lookup::with("salarySnippet.text", salary_text),
        Lookup::with("baseSalary", salary_text),
        Lookup::with("estimatedSalary", salary_text),
        Lookup::with("compensation", salary_text),
        Lookup::with("pay", salary_text),
    ],
    job_type: &[
        Lookup::with("jobType", text_or_list),
        Lookup::with("jobTypes", text_or_list),
        Lookup::with("employmentType", text_or_list),
        Lookup::with("contractType", text_or_list),
    ],
    posted_date: &[
        Lookup::text("postedDate"),
        Lookup::text("datePosted"),
        Lookup::text("postedAt"),
        Lookup::text("formattedRelativeTime"),
        Lookup::text("listingDate"),
        Lookup::text("pubDate"),
        Lookup::text("createdAt"),
        Lookup::text("date"),
    ],
    description: &[
        Lookup::with("descriptionHtml", raw_string),
        Lookup::with("description", raw_string),
        Lookup::with("jobDescription", raw_string),
        Lookup::with("snippet", raw_string),
        Lookup::with("summary", raw_string),
        Lookup::with("descriptionSnippet", raw_string),
    ],
    url: &[
        Lookup::text("url"),
        Lookup::text("jobUrl"),
        Lookup::text("link"),
        Lookup::text("detailUrl"),
        Lookup::text("viewJobLink"),
        Lookup::text("canonicalUrl"),
        Lookup::text("href"),
        Lookup::text("applyUrl"),
    ],
    id: &[
        Lookup::text("id"),
        Lookup::text("jobId"),
        Lookup::text("jobKey"),
        Lookup::text("jobkey"),
        Lookup::text("uuid"),
    ],
};

const JSON_LD_FIELDS: FieldTable = FieldTable {
    title: &[Lookup::text("title"), Lookup::text("name")],
    company: &[
        Lookup::text("hiringOrganization.name"),
        Lookup::text("hiringOrganization"),
    ],
    location: &[
        Lookup::with("jobLocation", location_text),
        Lookup::with("applicantLocationRequirements", location_text),
        Lookup::with("jobLocationType", location_text),
    ],
    salary: &[
        Lookup::with("baseSalary", salary_text),
        Lookup::with("estimatedSalary", salary_text),
    ],
    job_type: &[Lookup::with("employmentType", text_or_list)],
    posted_date: &[Lookup::text("datePosted")],
    description: &[Lookup::with("description", raw_string)],
    url: &[Lookup::text("url"), Lookup::text("sameAs")],
    id: &[
        Lookup::text("identifier.value"),
        Lookup::text("identifier"),
    ],
};

/// Keys written by the markup extractor
const DOM_FIELDS: FieldTable = FieldTable {
    title: &[Lookup::text("title")],
    company: &[Lookup::text("company")],
    location: &[Lookup::text("location")],
    salary: &[Lookup::text("salary")],
    job_type: &[Lookup::text("jobType")],
    posted_date: &[Lookup::text("postedDate")],
    description: &[Lookup::with("descriptionHtml", raw_string)],
    url: &[Lookup::text("url")],
    id: &[Lookup::text("id")],
};

fn fields_for(method: ExtractionMethod) -> &'static FieldTable {
    match method {
        ExtractionMethod::Intercepted | ExtractionMethod::Hydration => &PAYLOAD_FIELDS,
        ExtractionMethod::JsonLd => &JSON_LD_FIELDS,
        ExtractionMethod::Dom => &DOM_FIELDS,
    }
}

/// Coalesce a location value into free text
///
/// Strings pass through. Structured addresses become a comma-joined
/// `city, region, country`. Arrays use their first usable entry.
#[must_use]
pub fn location_text(value: &Value) -> Option<String> {
    const CITY: &[&str] = &["city", "addressLocality", "locality"];
    const REGION: &[&str] = &["region", "state", "addressRegion", "stateCode"];
    const COUNTRY: &[&str] = &["country", "addressCountry", "countryCode"];

    fn part(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| match map.get(*k) {
            Some(Value::Object(inner)) => inner.get("name").and_then(scalar_text),
            Some(other) => scalar_text(other),
            None => None,
        })
    }

    match value {
        Value::String(_) => scalar_text(value),
        Value::Array(items) => items.iter().find_map(location_text),
        Value::Object(map) => {
            if let Some(address) = map.get("address") {
                if let Some(text) = location_text(address) {
                    return Some(text);
                }
            }
            let parts: Vec<String> = [part(map, CITY), part(map, REGION), part(map, COUNTRY)]
                .into_iter()
                .flatten()
                .collect();
            if parts.is_empty() {
                ["displayName", "formatted", "name", "text"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(scalar_text))
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

/// Salary text with the `{value:{minValue,maxValue},currency}` shape special-cased
///
/// Any other shape passes through as text; objects are kept as compact JSON.
#[must_use]
pub fn salary_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            if let Some(range) = salary_range(value) {
                return Some(range);
            }
            if map.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }
        other => scalar_text(other),
    }
}

fn salary_range(value: &Value) -> Option<String> {
    let inner = value.get("value")?;
    let currency = value
        .get("currency")
        .and_then(scalar_text)
        .unwrap_or_default();

    let bound = |key: &str| match inner.get(key) {
        Some(Value::Number(n)) => Some(format_number(n)),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    let amount = match (bound("minValue"), bound("maxValue")) {
        (Some(min), Some(max)) => format!("{min} - {max}"),
        (Some(single), None) | (None, Some(single)) => single,
        (None, None) => match inner {
            Value::Number(n) => format_number(n),
            _ => bound("value")?,
        },
    };

    Some(format!("{amount} {currency}").trim().to_string())
}

/// Converts candidates into records for one page
#[derive(Debug, Clone)]
pub struct Normalizer<'a> {
    base_url: &'a str,
    job_url_template: Option<&'a str>,
    scraped_at: DateTime<Utc>,
}

impl<'a> Normalizer<'a> {
    /// # Arguments
    ///
    /// * `base_url` - URL of the page the candidates came from, for relative links
    /// * `job_url_template` - detail URL with an `{id}` placeholder, for id-only items
    #[must_use]
    pub fn new(base_url: &'a str, job_url_template: Option<&'a str>) -> Self {
        Self {
            base_url,
            job_url_template,
            scraped_at: Utc::now(),
        }
    }

    fn resolve_url(&self, payload: &Value, fields: &FieldTable) -> String {
        if let Some(url) = fields
            .url
            .iter()
            .filter_map(|lookup| lookup.apply(payload))
            .find_map(|href| absolutize(self.base_url, &href))
        {
            return url;
        }

        match (self.job_url_template, first_match(payload, fields.id)) {
            (Some(template), Some(id)) => {
                absolutize(self.base_url, &template.replace("{id}", &id)).unwrap_or_default()
            }
            _ => String::new(),
        }
    }

    /// `None` when the candidate has neither a usable title nor a usable URL
    #[must_use]
    pub fn normalize(&self, candidate: &RawJobCandidate) -> Option<JobRecord> {
        let fields = fields_for(candidate.method);
        let payload = &candidate.payload;

        let title = first_match(payload, fields.title)
            .map(|t| strip_html(&t))
            .unwrap_or_default();
        let url = self.resolve_url(payload, fields);
        if title.is_empty() && url.is_empty() {
            return None;
        }

        let description_html = first_match(payload, fields.description).unwrap_or_default();
        let description_text = strip_html(&description_html);

        Some(JobRecord {
            title,
            company: first_match(payload, fields.company)
                .map(|c| strip_html(&c))
                .unwrap_or_default(),
            location: first_match(payload, fields.location).unwrap_or_default(),
            salary: first_match(payload, fields.salary)
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            job_type: first_match(payload, fields.job_type)
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            posted_date: first_match(payload, fields.posted_date).unwrap_or_default(),
            description_html,
            description_text,
            url,
            scraped_at: self.scraped_at,
        })
    }

    /// Normalize a batch, returning records and the number discarded
    #[must_use]
    pub fn normalize_all(&self, candidates: &[RawJobCandidate]) -> (Vec<JobRecord>, usize) {
        let records: Vec<JobRecord> = candidates.iter().filter_map(|c| self.normalize(c)).collect();
        let discarded = candidates.len() - records.len();
        (records, discarded)
    }
}

/// `employmentType` of the first `JobPosting` in a parsed JSON-LD value
#[must_use]
pub fn employment_type(posting: &Value) -> Option<String> {
    value_at(posting, "employmentType").and_then(text_or_list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(method: ExtractionMethod, payload: Value) -> Option<JobRecord> {
        Normalizer::new("https://jobs.test/search?q=rust", Some("/viewjob?jk={id}"))
            .normalize(&RawJobCandidate::new(method, payload))
    }

    #[test]
    fn no_title_and_no_url_is_dropped() {
        assert!(normalize(ExtractionMethod::Intercepted, json!({ "company": "Acme" })).is_none());
        assert!(normalize(ExtractionMethod::Dom, json!({ "title": "   " })).is_none());
        assert!(normalize(ExtractionMethod::JsonLd, json!({ "@type": "JobPosting" })).is_none());
    }

    #[test]
    fn url_alone_is_enough() {
        let record = normalize(ExtractionMethod::Dom, json!({ "url": "/job/9" })).expect("record");
        assert_eq!(record.title, "");
        assert_eq!(record.url, "https://jobs.test/job/9");
    }

    #[test]
    fn salary_range_is_formatted() {
        let record = normalize(
            ExtractionMethod::JsonLd,
            json!({
                "title": "Engineer",
                "baseSalary": {
                    "@type": "MonetaryAmount",
                    "currency": "USD",
                    "value": { "@type": "QuantitativeValue", "minValue": 50000, "maxValue": 70000, "unitText": "YEAR" }
                }
            }),
        )
        .expect("record");
        assert_eq!(record.salary, "50000 - 70000 USD");
    }

    #[test]
    fn missing_salary_and_type_are_not_specified() {
        let record = normalize(ExtractionMethod::Hydration, json!({ "title": "Engineer", "id": 1 }))
            .expect("record");
        assert_eq!(record.salary, NOT_SPECIFIED);
        assert_eq!(record.job_type, NOT_SPECIFIED);
    }

    #[test]
    fn other_salary_shapes_pass_through() {
        let record = normalize(
            ExtractionMethod::Intercepted,
            json!({ "title": "Engineer", "salary": "$40 - $50 an hour" }),
        )
        .expect("record");
        assert_eq!(record.salary, "$40 - $50 an hour");
    }

    #[test]
    fn description_text_is_derived_from_html() {
        let record = normalize(
            ExtractionMethod::Intercepted,
            json!({ "title": "Engineer", "description": "<p>Hello <b>World</b></p>" }),
        )
        .expect("record");
        assert_eq!(record.description_html, "<p>Hello <b>World</b></p>");
        assert_eq!(record.description_text, "Hello World");
    }

    #[test]
    fn structured_location_is_comma_joined() {
        let record = normalize(
            ExtractionMethod::JsonLd,
            json!({
                "title": "Engineer",
                "jobLocation": [{
                    "@type": "Place",
                    "address": {
                        "addressLocality": "Austin",
                        "addressRegion": "TX",
                        "addressCountry": { "@type": "Country", "name": "US" }
                    }
                }]
            }),
        )
        .expect("record");
        assert_eq!(record.location, "Austin, TX, US");
    }

    #[test]
    fn plain_location_passes_through() {
        let record = normalize(
            ExtractionMethod::Hydration,
            json!({ "jobTitle": "Engineer", "jobKey": "k1", "location": "Remote" }),
        )
        .expect("record");
        assert_eq!(record.location, "Remote");
    }

    #[test]
    fn id_only_items_use_the_url_template() {
        let record = normalize(
            ExtractionMethod::Hydration,
            json!({ "jobTitle": "Engineer", "jobKey": "abc123" }),
        )
        .expect("record");
        assert_eq!(record.url, "https://jobs.test/viewjob?jk=abc123");
    }

    #[test]
    fn list_employment_type_is_joined() {
        let record = normalize(
            ExtractionMethod::JsonLd,
            json!({ "title": "Engineer", "employmentType": ["FULL_TIME", "CONTRACTOR"] }),
        )
        .expect("record");
        assert_eq!(record.job_type, "FULL_TIME, CONTRACTOR");
    }

    #[test]
    fn normalize_all_counts_discards() {
        let normalizer = Normalizer::new("https://jobs.test/", None);
        let candidates = vec![
            RawJobCandidate::new(ExtractionMethod::Dom, json!({ "title": "A" })),
            RawJobCandidate::new(ExtractionMethod::Dom, json!({ "company": "nobody" })),
        ];
        let (records, discarded) = normalizer.normalize_all(&candidates);
        assert_eq!(records.len(), 1);
        assert_eq!(discarded, 1);
    }
}
