//! Brief → self-contained HTML document.
//!
//! Every section branches on the actual shape of each element: records get
//! their structured layout, anything else falls back to its text. Every value
//! passes through [`escape_html`] before it is embedded.

use chrono::Utc;
use serde_json::Value;

use positioning_shared::{
    AudienceMessage, Avoidance, CompetitiveResponse, Entry, PositioningBrief,
    PositioningStatement, ValueProposition, WhiteSpaceItem, text_of,
};

/// Name printed on the cover and in the footer.
pub const GENERATOR: &str = "Competitive Positioning Engine";

const STYLESHEET: &str = include_str!("brief.css");

/// Escape text for embedding in element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// `positioning_elements` attribute label: `primary_claim` → `Primary Claim`.
pub fn title_case(key: &str) -> String {
    key.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Render the complete document. Missing sections render empty; this never fails.
pub fn render_html(brief: &PositioningBrief) -> String {
    let company = escape_html(&brief.company().unwrap_or_else(|| "Unknown".into()));
    let date = escape_html(
        &brief
            .date()
            .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
    );
    let competitors = brief.competitors();
    let versus = if competitors.is_empty() {
        "N/A".to_string()
    } else {
        competitors
            .iter()
            .map(|c| escape_html(c))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut body = String::new();

    body.push_str(&format!(
        r#"<div class="cover">
    <div class="accent"></div>
    <h1>Positioning Brief</h1>
    <div class="subtitle">{company} vs. {versus}</div>
    <div class="meta">
        <span>{GENERATOR}</span>
        <span>{date}</span>
    </div>
</div>
"#
    ));

    body.push_str(&format!(
        "\n<h2>Executive Summary</h2>\n<div class=\"exec-summary\">{}</div>\n",
        escape_html(&brief.executive_summary())
    ));

    body.push_str("\n<h2>Positioning Elements</h2>\n");
    body.push_str("<p>Extracted from website copy and public positioning signals.</p>\n");
    body.push_str(&positioning_elements(brief));

    if let Some(map) = brief.territory_map() {
        body.push_str("\n<h2>Territory Map</h2>\n");
        body.push_str("<p>Who owns which positioning territory today.</p>\n");
        body.push_str(&territory_map(map));
    }

    body.push_str("\n<div class=\"page-break\"></div>\n\n<h2>White Space</h2>\n");
    body.push_str("<p>Positioning territories that are unclaimed or weakly held.</p>\n");
    body.push_str(&render_entries(&brief.white_space(), white_space_item));

    body.push_str("\n<h2>Messaging Framework</h2>\n");

    body.push_str("\n<h3>Positioning Statements</h3>\n");
    body.push_str(&positioning_statements(&brief.positioning_statements()));

    body.push_str("\n<h3>One-Liner Options</h3>\n");
    for liner in brief.one_liners() {
        body.push_str(&format!(
            "<div class=\"one-liner\">{}</div>\n",
            escape_html(&liner)
        ));
    }

    body.push_str("\n<div class=\"page-break\"></div>\n\n<h3>Value Propositions</h3>\n<div>\n");
    body.push_str(&render_entries(&brief.value_propositions(), value_proposition));
    body.push_str("</div>\n");

    let audiences = brief.audience_messaging();
    if !audiences.is_empty() {
        body.push_str("\n<h3>Audience Messaging</h3>\n");
        body.push_str(&render_entries(&audiences, audience_message));
    }

    body.push_str("\n<h3>What NOT to Say</h3>\n");
    body.push_str(&render_entries(&brief.what_not_to_say(), avoidance));

    body.push_str("\n<div class=\"page-break\"></div>\n\n<h3>Competitive Response</h3>\n");
    body.push_str(&render_entries(
        &brief.competitive_responses(),
        competitive_response,
    ));

    body.push_str(&format!(
        "\n<div class=\"footer\">\n    Generated by {GENERATOR}\n</div>\n"
    ));

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Positioning Brief: {company}</title>\n<style>\n{STYLESHEET}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn positioning_elements(brief: &PositioningBrief) -> String {
    let mut out = String::new();
    for entity in brief.positioning_elements() {
        let inner = match &entity.attributes {
            Entry::Structured(rows) => {
                let rows: String = rows
                    .iter()
                    .map(|(key, value)| {
                        format!(
                            "<tr><td class=\"label\">{}</td><td>{}</td></tr>",
                            escape_html(&title_case(key)),
                            escape_html(value)
                        )
                    })
                    .collect();
                format!("<table class=\"elements-table\">{rows}</table>")
            }
            Entry::PlainText(text) | Entry::Other(text) => {
                format!("<p>{}</p>", escape_html(text))
            }
        };
        out.push_str(&format!(
            "<div class=\"company-card\"><h3>{}</h3>{inner}</div>\n",
            escape_html(&entity.name)
        ));
    }
    out
}

fn territory_map(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let rows: String = map
                .iter()
                .map(|(key, v)| {
                    format!(
                        "<tr><td class=\"label\">{}</td><td>{}</td></tr>",
                        escape_html(&title_case(key)),
                        escape_html(&inline_text(v))
                    )
                })
                .collect();
            format!("<table class=\"territory-table\">{rows}</table>\n")
        }
        Value::Array(items) => {
            let items: String = items
                .iter()
                .map(|v| format!("<li>{}</li>", escape_html(&inline_text(v))))
                .collect();
            format!("<ul class=\"territory-list\">{items}</ul>\n")
        }
        other => format!("<p>{}</p>\n", escape_html(&inline_text(other))),
    }
}

/// Flatten nested values into one readable line.
fn inline_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(inline_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", title_case(k), inline_text(v)))
            .collect::<Vec<_>>()
            .join("; "),
        other => text_of(other),
    }
}

fn positioning_statements(entries: &[Entry<PositioningStatement>]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let number = i + 1;
        let (angle, text) = match entry {
            Entry::Structured(stmt) => (stmt.angle.as_str(), stmt.text.as_str()),
            Entry::PlainText(text) | Entry::Other(text) => ("", text.as_str()),
        };
        let angle = if angle.is_empty() {
            String::new()
        } else {
            format!("<div class=\"pos-angle\">{}</div>", escape_html(angle))
        };
        out.push_str(&format!(
            "<div class=\"pos-statement\"><div class=\"pos-number\">Option {number}</div>{angle}<div class=\"pos-text\">{}</div></div>\n",
            escape_html(text)
        ));
    }
    out
}

/// Render each entry with `structured` or, for non-records, the plain fallback.
fn render_entries<T>(entries: &[Entry<T>], structured: fn(&T) -> String) -> String {
    entries
        .iter()
        .map(|entry| match entry {
            Entry::Structured(record) => structured(record),
            Entry::PlainText(text) | Entry::Other(text) => plain_entry(text),
        })
        .collect()
}

fn plain_entry(text: &str) -> String {
    format!("<div class=\"plain-item\"><p>{}</p></div>\n", escape_html(text))
}

fn white_space_item(item: &WhiteSpaceItem) -> String {
    format!(
        "<div class=\"white-space-item\"><strong>{}</strong><p>{}</p></div>\n",
        escape_html(&item.territory),
        escape_html(&item.rationale)
    )
}

fn value_proposition(vp: &ValueProposition) -> String {
    format!(
        "<div class=\"vp-card\"><h4>{}</h4><p>{}</p><div class=\"proof\">{}</div></div>\n",
        escape_html(&vp.headline),
        escape_html(&vp.supporting),
        escape_html(&vp.proof_point)
    )
}

fn audience_message(msg: &AudienceMessage) -> String {
    format!(
        "<div class=\"audience-item\"><span class=\"audience-name\">{}</span><p>{}</p></div>\n",
        escape_html(&msg.audience),
        escape_html(&msg.message)
    )
}

fn avoidance(item: &Avoidance) -> String {
    format!(
        "<div class=\"wnts-item\"><span class=\"wnts-phrase\">{}</span><span class=\"wnts-reason\">{}</span></div>\n",
        escape_html(&item.phrase),
        escape_html(&item.reason)
    )
}

fn competitive_response(resp: &CompetitiveResponse) -> String {
    format!(
        r#"<div class="cr-card"><h4>vs. {}</h4>
    <div class="cr-row"><span class="cr-label">Their strength:</span> {}</div>
    <div class="cr-row"><span class="cr-label">Their weakness:</span> {}</div>
    <div class="cr-row"><span class="cr-label">Our counter:</span> {}</div></div>
"#,
        escape_html(&resp.competitor),
        escape_html(&resp.their_strength),
        escape_html(&resp.their_weakness),
        escape_html(&resp.our_counter)
    )
}
