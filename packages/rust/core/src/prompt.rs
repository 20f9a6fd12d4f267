//! Prompt assembly: collected pages plus reference corpora → instruction
//! and content text for one generation request.
//!
//! Output is deterministic for identical inputs: the run date is a
//! parameter, and target/competitor order is preserved as supplied.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use positioning_shared::{CompanyScrape, DefaultsConfig, PageRecord};

/// Per-page body text budget, in characters.
pub const MAX_BODY_CHARS: usize = 2000;
const MAX_HEADINGS: usize = 20;
const MAX_CTAS: usize = 15;

const PHASES_HEADING: &str = "### Phase 2: Extract Positioning Elements";
const PHASES_FALLBACK_HEADING: &str = "### Phase 2:";
const PHASES_END_MARKERS: [&str; 2] = ["### Phase 6:", "## Rules"];

const OUTPUT_RULES: &str = "# Output Rules
1. Return ONLY valid JSON. No markdown fencing, no commentary before or after.
2. Match the schema above exactly: company, date, website, competitors, executive_summary, positioning_elements, territory_map, white_space, messaging_framework.
3. Every claim must trace to scraped data or the reference files. No invented stats.
4. The competitor test: if a competitor could say the same thing, push harder.
5. No filler: no 'in today's competitive landscape', no 'it's worth noting'.
6. Be specific and direct. This goes to a CMO, not a chatbot.";

// ---------------------------------------------------------------------------
// Reference corpus
// ---------------------------------------------------------------------------

/// Reference material embedded in the instruction text. Every block is
/// optional; absent blocks are left out of the prompt.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCorpus {
    /// Phase 2-5 section of the analytical playbook.
    pub phases: Option<String>,
    pub frameworks: Option<String>,
    pub messaging_map: Option<String>,
    /// Complete example brief pinning the output schema.
    pub example_brief: Option<String>,
}

impl ReferenceCorpus {
    /// Load the configured reference files, resolving relative paths
    /// against `base_dir`.
    pub fn load(defaults: &DefaultsConfig, base_dir: &Path) -> Self {
        let resolve = |p: &str| -> PathBuf {
            let path = Path::new(p);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            }
        };

        let corpus = Self {
            phases: read_optional(&resolve(&defaults.playbook))
                .map(|text| extract_playbook_phases(&text))
                .filter(|s| !s.is_empty()),
            frameworks: read_optional(&resolve(&defaults.frameworks)),
            messaging_map: read_optional(&resolve(&defaults.messaging_map)),
            example_brief: read_optional(&resolve(&defaults.example_brief)),
        };

        debug!(
            phases = corpus.phases.is_some(),
            frameworks = corpus.frameworks.is_some(),
            messaging_map = corpus.messaging_map.is_some(),
            example_brief = corpus.example_brief.is_some(),
            "reference corpus loaded"
        );
        corpus
    }
}

fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            warn!(path = %path.display(), "reference file is empty, skipping");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "reference file not readable, skipping");
            None
        }
    }
}

/// The playbook section from the phase 2 heading up to the phase 6 or rules
/// heading. Falls back to everything from any phase 2 heading, then to the
/// whole text.
pub fn extract_playbook_phases(text: &str) -> String {
    if let Some(start) = text.find(PHASES_HEADING) {
        let rest = &text[start..];
        let end = PHASES_END_MARKERS
            .iter()
            .filter_map(|marker| rest.find(marker))
            .min()
            .unwrap_or(rest.len());
        return rest[..end].trim().to_string();
    }

    match text.find(PHASES_FALLBACK_HEADING) {
        Some(start) => text[start..].trim().to_string(),
        None => text.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// The two text blocks of one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub instruction: String,
    pub content: String,
}

impl Prompt {
    /// Rough input size: four characters per token.
    pub fn estimated_tokens(&self) -> usize {
        (self.instruction.chars().count() + self.content.chars().count()) / 4
    }
}

/// Build the full prompt for a target and its competitors.
pub fn assemble_prompt(
    corpus: &ReferenceCorpus,
    target: &CompanyScrape,
    competitors: &[CompanyScrape],
    date: NaiveDate,
) -> Prompt {
    let prompt = Prompt {
        instruction: build_instruction_text(corpus),
        content: build_content_text(target, competitors, date),
    };
    info!(
        target = %target.company,
        competitors = competitors.len(),
        estimated_tokens = prompt.estimated_tokens(),
        "prompt assembled"
    );
    prompt
}

pub fn build_instruction_text(corpus: &ReferenceCorpus) -> String {
    let mut parts: Vec<String> = vec![
        "You are a positioning strategist. Your task is to analyze scraped website data \
         for a company and its competitors, then produce a structured positioning brief."
            .into(),
    ];

    if let Some(phases) = &corpus.phases {
        parts.push(format!("Follow these analytical phases:\n\n{phases}"));
    }
    if let Some(frameworks) = &corpus.frameworks {
        parts.push(format!(
            "---\n\n# Reference: Positioning Frameworks\n{}",
            frameworks.trim_end()
        ));
    }
    if let Some(map) = &corpus.messaging_map {
        parts.push(format!(
            "---\n\n# Reference: Messaging Map (known positioning of major players)\n{}",
            map.trim_end()
        ));
    }
    if let Some(example) = &corpus.example_brief {
        parts.push(format!(
            "---\n\n# Output Schema (follow this structure exactly)\n\
             Here is a complete example of the expected JSON output. Your output must have the same \
             top-level keys and nested structure. All text values should be specific, evidence-based, \
             and grounded in the scraped data.\n\n```json\n{}\n```",
            example.trim()
        ));
    }

    parts.push(format!("---\n\n{OUTPUT_RULES}"));
    parts.join("\n\n")
}

pub fn build_content_text(
    target: &CompanyScrape,
    competitors: &[CompanyScrape],
    date: NaiveDate,
) -> String {
    let mut parts = vec![
        "Analyze the following scraped website data and produce a positioning brief JSON.".to_string(),
        String::new(),
        "# Target Company".to_string(),
        format_company(target),
    ];

    if !competitors.is_empty() {
        parts.push("\n# Competitors".into());
        for competitor in competitors {
            parts.push(String::new());
            parts.push(format_company(competitor));
        }
    }

    let names = if competitors.is_empty() {
        "(use reference data from the messaging map)".to_string()
    } else {
        competitors
            .iter()
            .map(|c| c.company.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    parts.extend([
        String::new(),
        "# Instructions".into(),
        format!("Target company: {}", target.company),
        format!("Website: {}", target.website),
        format!("Competitors to analyze against: {names}"),
        format!("Date: {}", date.format("%Y-%m-%d")),
        String::new(),
        "Produce the complete positioning brief JSON now.".into(),
    ]);

    parts.join("\n")
}

fn format_company(scrape: &CompanyScrape) -> String {
    let mut sections = vec![
        format!("## {} ({})", scrape.company, scrape.website),
        format!("Scraped {} pages.", scrape.pages.len()),
    ];
    for page in &scrape.pages {
        sections.push(format!("\n### {} page", capitalize(&page.page_type)));
        sections.push(format_page(page));
    }
    sections.join("\n")
}

fn format_page(page: &PageRecord) -> String {
    let mut lines = vec![
        format!("URL: {}", page.url),
        format!("Page type: {}", page.page_type),
    ];

    if !page.title.is_empty() {
        lines.push(format!("Title: {}", page.title));
    }
    if !page.meta_description.is_empty() {
        lines.push(format!("Meta description: {}", page.meta_description));
    }
    if !page.headings.is_empty() {
        let headings: Vec<String> = page
            .headings
            .iter()
            .take(MAX_HEADINGS)
            .map(|h| format!("  {}: {}", h.tag, h.text))
            .collect();
        lines.push(format!("Headings:\n{}", headings.join("\n")));
    }
    if !page.cta_texts.is_empty() {
        let ctas: Vec<&str> = page
            .cta_texts
            .iter()
            .take(MAX_CTAS)
            .map(String::as_str)
            .collect();
        lines.push(format!("CTAs/buttons: {}", ctas.join(" | ")));
    }
    if !page.body_text.is_empty() {
        lines.push(format!("Body text:\n{}", truncate_body(&page.body_text)));
    }

    lines.join("\n")
}

/// Cut `body` to [`MAX_BODY_CHARS`] characters, appending a marker with the
/// original length when anything was dropped.
pub fn truncate_body(body: &str) -> String {
    let total = body.chars().count();
    if total <= MAX_BODY_CHARS {
        return body.to_string();
    }
    let kept: String = body.chars().take(MAX_BODY_CHARS).collect();
    format!("{kept}\n[...truncated, {total} chars total]")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => "Unknown".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use positioning_shared::Heading;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 17).unwrap()
    }

    fn scrape(company: &str, pages: Vec<PageRecord>) -> CompanyScrape {
        let mut scrape = CompanyScrape::new(company, format!("https://{}.example", company.to_lowercase()));
        scrape.pages = pages;
        scrape
    }

    fn homepage(body: &str) -> PageRecord {
        PageRecord {
            url: "https://acme.example".into(),
            page_type: "homepage".into(),
            title: "Acme Bank".into(),
            body_text: body.into(),
            ..Default::default()
        }
    }

    #[test]
    fn long_body_is_truncated_with_marker() {
        let body = format!("{}{}", "a".repeat(2000), "b".repeat(500));
        let text = build_content_text(&scrape("Acme", vec![homepage(&body)]), &[], date());

        assert!(text.contains(&format!("{}\n[...truncated, 2500 chars total]", "a".repeat(2000))));
        assert!(!text.contains("bb"));
    }

    #[test]
    fn truncation_counts_characters() {
        let body = "é".repeat(2001);
        let out = truncate_body(&body);
        assert!(out.starts_with(&"é".repeat(2000)));
        assert!(out.ends_with("\n[...truncated, 2001 chars total]"));

        let short = "é".repeat(2000);
        assert_eq!(truncate_body(&short), short);
    }

    #[test]
    fn page_format_caps_headings_and_ctas() {
        let page = PageRecord {
            url: "https://acme.example/features".into(),
            page_type: "features".into(),
            headings: (0..25)
                .map(|i| Heading { tag: "H2".into(), text: format!("Feature {i}") })
                .collect(),
            cta_texts: (0..18).map(|i| format!("CTA {i}")).collect(),
            ..Default::default()
        };
        let text = format_page(&page);

        assert!(text.contains("Headings:\n  H2: Feature 0\n  H2: Feature 1"));
        assert!(text.contains("  H2: Feature 19"));
        assert!(!text.contains("Feature 20"));
        assert!(text.contains("CTAs/buttons: CTA 0 | CTA 1"));
        assert!(text.contains("CTA 14"));
        assert!(!text.contains("CTA 15"));
        assert!(!text.contains("Title:"));
        assert!(!text.contains("Meta description:"));
    }

    #[test]
    fn sections_keep_supplied_order() {
        let target = scrape("Acme", vec![homepage("Target body text.")]);
        let competitors = vec![
            scrape("Revolut", vec![homepage("Revolut body.")]),
            scrape("Wise", vec![]),
        ];
        let text = build_content_text(&target, &competitors, date());

        let target_at = text.find("## Acme (").unwrap();
        let revolut_at = text.find("## Revolut (").unwrap();
        let wise_at = text.find("## Wise (").unwrap();
        assert!(target_at < revolut_at && revolut_at < wise_at);
        assert!(text.contains("### Homepage page"));
        assert!(text.contains("Competitors to analyze against: Revolut, Wise"));
        assert!(text.contains("Date: 2026-02-17"));
        assert!(text.ends_with("Produce the complete positioning brief JSON now."));
    }

    #[test]
    fn no_competitors_points_at_messaging_map() {
        let text = build_content_text(&scrape("Acme", vec![]), &[], date());
        assert!(!text.contains("# Competitors"));
        assert!(text.contains("(use reference data from the messaging map)"));
    }

    #[test]
    fn content_text_is_deterministic() {
        let target = scrape("Acme", vec![homepage("Body")]);
        assert_eq!(
            build_content_text(&target, &[], date()),
            build_content_text(&target, &[], date())
        );
    }

    #[test]
    fn missing_references_are_omitted() {
        let text = build_instruction_text(&ReferenceCorpus::default());
        assert!(text.starts_with("You are a positioning strategist."));
        assert!(!text.contains("Reference: Positioning Frameworks"));
        assert!(!text.contains("```json"));
        assert!(text.ends_with("This goes to a CMO, not a chatbot."));
    }

    #[test]
    fn references_are_embedded_in_order() {
        let corpus = ReferenceCorpus {
            phases: Some("### Phase 2: Extract Positioning Elements\nDo it.".into()),
            frameworks: Some("April Dunford".into()),
            messaging_map: Some("Revolut: everything app".into()),
            example_brief: Some("{\"company\": \"KAST\"}".into()),
        };
        let text = build_instruction_text(&corpus);

        let phases = text.find("Follow these analytical phases:").unwrap();
        let frameworks = text.find("April Dunford").unwrap();
        let map = text.find("Revolut: everything app").unwrap();
        let example = text.find("```json\n{\"company\": \"KAST\"}\n```").unwrap();
        let rules = text.find("# Output Rules").unwrap();
        assert!(phases < frameworks && frameworks < map && map < example && example < rules);
    }

    #[test]
    fn playbook_phases_are_sliced() {
        let playbook = "# Skill\n### Phase 1: Scrape\nscrape\n### Phase 2: Extract Positioning Elements\nextract\n### Phase 5: Write\nwrite\n### Phase 6: Render\nrender\n## Rules\nrules";
        assert_eq!(
            extract_playbook_phases(playbook),
            "### Phase 2: Extract Positioning Elements\nextract\n### Phase 5: Write\nwrite"
        );

        let rules_first = "### Phase 2: Extract Positioning Elements\nextract\n## Rules\nrules";
        assert_eq!(
            extract_playbook_phases(rules_first),
            "### Phase 2: Extract Positioning Elements\nextract"
        );

        let fallback = "intro\n### Phase 2: Something else\nbody";
        assert_eq!(extract_playbook_phases(fallback), "### Phase 2: Something else\nbody");

        assert_eq!(extract_playbook_phases("  just text  "), "just text");
    }

    #[test]
    fn corpus_loads_from_disk_and_skips_missing() {
        let dir = std::env::temp_dir().join(format!("pos-corpus-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(dir.join("references")).unwrap();
        std::fs::write(
            dir.join("SKILL.md"),
            "### Phase 2: Extract Positioning Elements\nsteps\n## Rules\nnone",
        )
        .unwrap();
        std::fs::write(dir.join("references/positioning-frameworks.md"), "Frameworks").unwrap();

        let corpus = ReferenceCorpus::load(&DefaultsConfig::default(), &dir);
        assert_eq!(
            corpus.phases.as_deref(),
            Some("### Phase 2: Extract Positioning Elements\nsteps")
        );
        assert_eq!(corpus.frameworks.as_deref(), Some("Frameworks"));
        assert!(corpus.messaging_map.is_none());
        assert!(corpus.example_brief.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
