//! Collection-side domain types and the artifact slug.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Page type of a site's root page. It is the only type that may repeat.
pub const HOMEPAGE: &str = "homepage";

// ---------------------------------------------------------------------------
// PageRecord
// ---------------------------------------------------------------------------

/// A heading extracted from a page, e.g. `{ tag: "H2", text: "Pricing" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub tag: String,
    pub text: String,
}

/// One fetched page's extracted content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub page_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub headings: Vec<Heading>,
    /// Button and call-to-action labels, de-duplicated in page order.
    #[serde(default, alias = "links_text")]
    pub cta_texts: Vec<String>,
    #[serde(default)]
    pub body_text: String,
    /// Why the page could not be collected.
    #[serde(default)]
    pub error: Option<String>,
}

impl PageRecord {
    /// A record for a page that could not be collected.
    pub fn failed(url: impl Into<String>, page_type: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_type: page_type.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_homepage(&self) -> bool {
        self.page_type == HOMEPAGE
    }

    /// Body length in characters.
    pub fn body_chars(&self) -> usize {
        self.body_text.chars().count()
    }
}

// ---------------------------------------------------------------------------
// CompanyScrape
// ---------------------------------------------------------------------------

/// The collection artifact for one company (`<slug>-positioning.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyScrape {
    pub company: String,
    pub website: String,
    pub scraped_at: DateTime<Utc>,
    #[serde(default)]
    pub pages: Vec<PageRecord>,
}

impl CompanyScrape {
    pub fn new(company: impl Into<String>, website: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            website: website.into(),
            scraped_at: Utc::now(),
            pages: Vec::new(),
        }
    }

    pub fn slug(&self) -> String {
        slugify(&self.company)
    }
}

// ---------------------------------------------------------------------------
// Slug
// ---------------------------------------------------------------------------

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Filesystem-safe key for a company name: lowercase, runs of anything
/// other than `[a-z0-9]` collapsed to `-`, no leading/trailing `-`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_ALNUM
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_normalizes_names() {
        assert_eq!(slugify("Crypto.com"), "crypto-com");
        assert_eq!(slugify("KAST"), "kast");
        assert_eq!(slugify(" A  B! "), "a-b");
        assert_eq!(slugify(" A  B! "), slugify("a-b"));
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn slug_is_idempotent() {
        for name in ["Revolut Business", "N26 (Germany)", "  wise  ", "Ünïcode Bank"] {
            let once = slugify(name);
            assert_eq!(slugify(&once), once, "slug of {name:?} not stable");
        }
    }

    #[test]
    fn page_record_accepts_legacy_cta_key() {
        let json = r#"{
            "url": "https://example.com",
            "page_type": "homepage",
            "title": "Example",
            "meta_description": "",
            "headings": [{"tag": "H1", "text": "Banking, reimagined"}],
            "links_text": ["Get started", "Sign in"],
            "body_text": "Some body text",
            "error": null
        }"#;
        let record: PageRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(record.cta_texts, vec!["Get started", "Sign in"]);
        assert!(record.is_homepage());
    }

    #[test]
    fn company_scrape_roundtrip() {
        let mut scrape = CompanyScrape::new("Acme Bank", "https://acme.example");
        scrape.pages.push(PageRecord {
            url: "https://acme.example".into(),
            page_type: HOMEPAGE.into(),
            body_text: "Hello".into(),
            ..Default::default()
        });

        let json = serde_json::to_string_pretty(&scrape).expect("serialize");
        assert!(json.contains("cta_texts"));
        let parsed: CompanyScrape = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.pages.len(), 1);
        assert_eq!(parsed.slug(), "acme-bank");
    }

    #[test]
    fn scrape_fixture_validates() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/acme-positioning.json")
            .expect("read fixture");
        let parsed: CompanyScrape = serde_json::from_str(&fixture).expect("deserialize fixture");
        assert_eq!(parsed.company, "Acme Bank");
        assert_eq!(parsed.pages.len(), 2);
        assert!(parsed.pages[0].is_homepage());
    }
}
