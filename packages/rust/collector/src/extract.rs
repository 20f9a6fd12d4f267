//! Positioning-relevant content extraction from a loaded HTML page.
//!
//! Pure: the same markup always yields the same [`PageRecord`].

use std::collections::HashSet;
use std::sync::LazyLock;

use positioning_shared::{Heading, PageRecord};
use scraper::{ElementRef, Html, Node, Selector};

/// Headings kept per page.
pub const MAX_HEADINGS: usize = 30;
/// Call-to-action labels kept per page.
pub const MAX_CTAS: usize = 20;
/// Body text budget in characters.
pub const MAX_BODY_CHARS: usize = 15_000;

const MAX_HEADING_CHARS: usize = 200;
const MAX_CTA_CHARS: usize = 60;
const MIN_TEXT_NODE_CHARS: usize = 10;
const MAX_TEXT_NODE_CHARS: usize = 500;

/// Elements whose text never counts as visible body copy.
const INVISIBLE: [&str; 4] = ["script", "style", "noscript", "template"];

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description"]"#));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3"));
static CTAS: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"button, a[class*="btn"], a[class*="cta"], [role="button"]"#)
});
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

/// Extract title, meta description, headings, CTA labels and visible body
/// text from `html`.
pub fn extract_page(html: &str, url: &str, page_type: &str) -> PageRecord {
    let doc = Html::parse_document(html);

    PageRecord {
        url: url.to_string(),
        page_type: page_type.to_string(),
        title: extract_title(&doc),
        meta_description: extract_meta_description(&doc),
        headings: extract_headings(&doc),
        cta_texts: extract_ctas(&doc),
        body_text: extract_body_text(&doc),
        error: None,
    }
}

fn extract_title(doc: &Html) -> String {
    doc.select(&TITLE)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default()
}

fn extract_meta_description(doc: &Html) -> String {
    doc.select(&META_DESCRIPTION)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn extract_headings(doc: &Html) -> Vec<Heading> {
    doc.select(&HEADINGS)
        .filter_map(|el| {
            let text = element_text(el);
            let len = text.chars().count();
            (len > 0 && len < MAX_HEADING_CHARS).then(|| Heading {
                tag: el.value().name().to_ascii_uppercase(),
                text,
            })
        })
        .take(MAX_HEADINGS)
        .collect()
}

fn extract_ctas(doc: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    doc.select(&CTAS)
        .map(element_text)
        .filter(|text| {
            let len = text.chars().count();
            len > 0 && len < MAX_CTA_CHARS
        })
        .filter(|text| seen.insert(text.clone()))
        .take(MAX_CTAS)
        .collect()
}

/// Text nodes under `<body>` outside invisible containers, trimmed and
/// kept when 11..=499 chars long, one per line.
fn extract_body_text(doc: &Html) -> String {
    let Some(body) = doc.select(&BODY).next() else {
        return String::new();
    };

    let mut lines = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| INVISIBLE.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        let len = trimmed.chars().count();
        if len > MIN_TEXT_NODE_CHARS && len < MAX_TEXT_NODE_CHARS {
            lines.push(trimmed);
        }
    }

    lines.join("\n").chars().take(MAX_BODY_CHARS).collect()
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
