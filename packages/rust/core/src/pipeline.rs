//! Stage entry points and the end-to-end run: collect → synthesize → render.
//!
//! Stages only talk through the artifacts in the output directory, so each
//! one can be run alone from the CLI against files a previous run left.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use positioning_collector::{Collector, PageFetcher};
use positioning_render::{Compositor, render_html};
use positioning_shared::{CompanyScrape, PageRecord, PositioningError, Result, slugify};

use crate::artifacts::{
    brief_path, html_path, pdf_path, read_brief, read_scrape, scrape_path, write_json, write_text,
};
use crate::generation::GenerationClient;
use crate::prompt::{ReferenceCorpus, assemble_prompt};
use crate::repair::run_with_repair;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for every page kept during collection.
    fn page_collected(&self, company: &str, page: &PageRecord);
    /// Called when a full run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_collected(&self, _company: &str, _page: &PageRecord) {}
    fn done(&self, _summary: &RunSummary) {}
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Output of the render stage.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub markup: String,
    pub html_path: PathBuf,
    /// Set only when a compositor produced the binary document.
    pub pdf_path: Option<PathBuf>,
}

/// Result of a full run.
#[derive(Debug)]
pub struct RunSummary {
    pub company: String,
    pub scrape_path: PathBuf,
    pub brief_path: PathBuf,
    pub document: RenderedDocument,
    /// Competitors whose artifacts went into the brief.
    pub competitors_included: Vec<String>,
    /// Competitors whose collection failed this run.
    pub competitors_failed: Vec<String>,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Collect one company and write `<slug>-positioning.json`.
pub async fn collect_company<F: PageFetcher>(
    collector: &Collector<F>,
    output_dir: &Path,
    company: &str,
    website: &str,
    progress: &dyn ProgressReporter,
) -> Result<PathBuf> {
    let slug = company_slug(company)?;
    progress.phase(&format!("Collecting {company}"));

    let scrape = collector
        .collect(company, website, |page| progress.page_collected(company, page))
        .await?;

    let path = scrape_path(output_dir, &slug);
    write_json(&path, &scrape)?;
    info!(path = %path.display(), pages = scrape.pages.len(), "collection artifact written");
    Ok(path)
}

fn company_slug(company: &str) -> Result<String> {
    let slug = slugify(company);
    if slug.is_empty() {
        return Err(PositioningError::config(format!(
            "company name '{company}' has no letters or digits"
        )));
    }
    Ok(slug)
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Inputs of the synthesis stage.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// The target's collection artifact.
    pub input: PathBuf,
    /// Competitor slugs looked up as `<slug>-positioning.json` in the output dir.
    pub competitor_slugs: Vec<String>,
    /// Explicit brief path; defaults to `<target-slug>-brief.json`.
    pub output: Option<PathBuf>,
    pub model: String,
    pub repair_attempts: u32,
    pub date: NaiveDate,
}

/// Assemble the prompt, generate a valid brief and write it.
#[instrument(skip_all, fields(input = %request.input.display()))]
pub async fn synthesize<C: GenerationClient>(
    client: &C,
    corpus: &ReferenceCorpus,
    output_dir: &Path,
    request: &SynthesisRequest,
    progress: &dyn ProgressReporter,
) -> Result<PathBuf> {
    progress.phase("Loading collected data");
    let target = read_scrape(&request.input)?;

    let mut competitors: Vec<CompanyScrape> = Vec::new();
    for slug in &request.competitor_slugs {
        let path = scrape_path(output_dir, slug);
        if !path.exists() {
            warn!(competitor = %slug, path = %path.display(), "competitor data not found, skipping");
            continue;
        }
        match read_scrape(&path) {
            Ok(scrape) => competitors.push(scrape),
            Err(e) => warn!(competitor = %slug, error = %e, "competitor data unreadable, skipping"),
        }
    }

    let prompt = assemble_prompt(corpus, &target, &competitors, request.date);

    progress.phase("Generating positioning brief");
    let brief = run_with_repair(client, &prompt, &request.model, request.repair_attempts).await?;

    let names: Vec<String> = competitors.iter().map(|c| c.company.clone()).collect();
    let brief = brief.with_defaults(&target.website, &names);

    let path = match &request.output {
        Some(path) => path.clone(),
        None => brief_path(output_dir, &target.slug()),
    };
    write_json(&path, &brief)?;
    info!(path = %path.display(), competitors = names.len(), "brief written");
    Ok(path)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a brief to HTML and, when a compositor is given, to PDF.
///
/// Compositor problems never fail the stage: the markup is kept and the
/// reason is logged.
pub fn render(
    brief_file: &Path,
    output_dir: &Path,
    compositor: Option<&dyn Compositor>,
    progress: &dyn ProgressReporter,
) -> Result<RenderedDocument> {
    progress.phase("Rendering document");
    let brief = read_brief(brief_file)?;

    let slug = brief
        .company()
        .map(|c| slugify(&c))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let markup = render_html(&brief);
    let html = html_path(output_dir, &slug);
    write_text(&html, &markup)?;
    info!(path = %html.display(), "markup written");

    let pdf = match compositor {
        Some(compositor) => {
            let pdf = pdf_path(output_dir, &slug);
            match compositor.compose(&html, &pdf) {
                Ok(()) => Some(pdf),
                Err(PositioningError::RenderDependencyMissing(reason)) => {
                    warn!(compositor = compositor.name(), %reason, "binary output unavailable, kept markup only");
                    None
                }
                Err(e) => {
                    warn!(compositor = compositor.name(), error = %e, "binary output failed, kept markup only");
                    None
                }
            }
        }
        None => None,
    };

    Ok(RenderedDocument {
        markup,
        html_path: html,
        pdf_path: pdf,
    })
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// A competitor given on the command line as `Name:URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitorTarget {
    pub name: String,
    pub website: String,
}

/// Split `Name:URL` at the first `:`. Returns `None` when either side is empty
/// or there is no `:` at all.
pub fn parse_competitor_pair(pair: &str) -> Option<CompetitorTarget> {
    let (name, website) = pair.split_once(':')?;
    let (name, website) = (name.trim(), website.trim());
    if name.is_empty() || website.is_empty() {
        return None;
    }
    Some(CompetitorTarget {
        name: name.to_string(),
        website: website.to_string(),
    })
}

/// Inputs of a full run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub company: String,
    pub website: String,
    /// Raw `Name:URL` pairs.
    pub competitors: Vec<String>,
    /// Reuse existing collection artifacts instead of collecting.
    pub skip_collection: bool,
    pub model: String,
    pub repair_attempts: u32,
    pub date: NaiveDate,
}

/// Everything a full run needs besides the request.
pub struct Stages<'a, F, C> {
    pub collector: &'a Collector<F>,
    pub client: &'a C,
    pub corpus: &'a ReferenceCorpus,
    pub compositor: Option<&'a dyn Compositor>,
    pub output_dir: &'a Path,
}

/// Run collect → synthesize → render for a target and its competitors.
///
/// A target collection failure aborts the run. Competitor failures are
/// logged and the competitor is left out of the brief.
#[instrument(skip_all, fields(company = %request.company))]
pub async fn coordinate<F: PageFetcher, C: GenerationClient>(
    stages: &Stages<'_, F, C>,
    request: &RunRequest,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let slug = company_slug(&request.company)?;

    let mut competitors: Vec<CompetitorTarget> = Vec::new();
    for pair in &request.competitors {
        match parse_competitor_pair(pair) {
            Some(target) if slugify(&target.name) == slug => {
                warn!(competitor = %target.name, "competitor shares the target's slug, skipping");
            }
            Some(target) => competitors.push(target),
            None => warn!(%pair, "competitor must be given as Name:URL, skipping"),
        }
    }

    info!(competitors = competitors.len(), skip_collection = request.skip_collection, "starting run");

    let mut competitors_failed = Vec::new();
    if request.skip_collection {
        info!("collection skipped, using existing artifacts");
    } else {
        collect_company(
            stages.collector,
            stages.output_dir,
            &request.company,
            &request.website,
            progress,
        )
        .await?;

        for competitor in &competitors {
            if let Err(e) = collect_company(
                stages.collector,
                stages.output_dir,
                &competitor.name,
                &competitor.website,
                progress,
            )
            .await
            {
                warn!(competitor = %competitor.name, error = %e, "competitor collection failed, leaving it out");
                competitors_failed.push(competitor.name.clone());
            }
        }
    }

    let target_path = scrape_path(stages.output_dir, &slug);
    if !target_path.exists() {
        return Err(PositioningError::input_not_found(&target_path));
    }

    let mut competitor_slugs = Vec::new();
    let mut competitors_included = Vec::new();
    for competitor in &competitors {
        let competitor_slug = slugify(&competitor.name);
        if competitor_slug.is_empty() || competitors_failed.contains(&competitor.name) {
            continue;
        }
        if scrape_path(stages.output_dir, &competitor_slug).exists() {
            competitor_slugs.push(competitor_slug);
            competitors_included.push(competitor.name.clone());
        } else {
            warn!(competitor = %competitor.name, "no collection artifact, leaving it out");
        }
    }

    let synthesis = SynthesisRequest {
        input: target_path.clone(),
        competitor_slugs,
        output: None,
        model: request.model.clone(),
        repair_attempts: request.repair_attempts,
        date: request.date,
    };
    let brief = synthesize(stages.client, stages.corpus, stages.output_dir, &synthesis, progress).await?;

    let document = render(&brief, stages.output_dir, stages.compositor, progress)?;

    let summary = RunSummary {
        company: request.company.clone(),
        scrape_path: target_path,
        brief_path: brief,
        document,
        competitors_included,
        competitors_failed,
        elapsed: start.elapsed(),
    };

    progress.done(&summary);

    info!(
        competitors = summary.competitors_included.len(),
        failed = summary.competitors_failed.len(),
        pdf = summary.document.pdf_path.is_some(),
        elapsed_ms = summary.elapsed.as_millis(),
        "run complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use positioning_render::CommandCompositor;
    use positioning_shared::{AppConfig, CollectConfig};
    use serde_json::json;

    use crate::generation::testing::ScriptedClient;

    /// Serves canned pages by URL; anything else fails like a dead host.
    struct StaticFetcher {
        pages: HashMap<String, PageRecord>,
    }

    impl StaticFetcher {
        fn new(pages: &[(&str, usize)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, chars)| {
                        let record = PageRecord {
                            url: url.to_string(),
                            title: format!("Title of {url}"),
                            body_text: "Self-custody banking. ".repeat(*chars / 22 + 1),
                            ..Default::default()
                        };
                        (url.to_string(), record)
                    })
                    .collect(),
            }
        }
    }

    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str, page_type: &str) -> PageRecord {
            match self.pages.get(url) {
                Some(record) => PageRecord {
                    page_type: page_type.to_string(),
                    ..record.clone()
                },
                None => PageRecord::failed(url, page_type, "connection refused"),
            }
        }
    }

    /// Records phases and collected pages.
    #[derive(Default)]
    struct RecordingProgress {
        phases: Mutex<Vec<String>>,
        pages: Mutex<Vec<String>>,
        done: Mutex<bool>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn page_collected(&self, company: &str, page: &PageRecord) {
            self.pages.lock().unwrap().push(format!("{company} {}", page.url));
        }
        fn done(&self, _summary: &RunSummary) {
            *self.done.lock().unwrap() = true;
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("pos-pipeline-test-{}", uuid::Uuid::now_v7()))
    }

    fn collect_config() -> CollectConfig {
        let mut config = CollectConfig::from(&AppConfig::default());
        config.settle = Duration::ZERO;
        config
    }

    fn brief_reply(entities: &[&str], competitors: &[&str]) -> String {
        let elements: serde_json::Map<String, serde_json::Value> = entities
            .iter()
            .map(|name| (name.to_string(), json!({"primary_claim": format!("{name} claim")})))
            .collect();
        json!({
            "company": "Acme Bank",
            "date": "2026-02-17",
            "competitors": competitors,
            "executive_summary": "Acme <b>owns</b> self-custody & trust.",
            "positioning_elements": elements,
            "territory_map": {"Self-custody": "Acme Bank"},
            "white_space": [{"territory": "Crypto payroll", "rationale": "Nobody claims it"}],
            "messaging_framework": {
                "positioning_statements": [{"angle": "Control", "statement": "Your keys, your bank."}],
                "one_liners": ["Banking on your terms."],
                "value_propositions": [],
                "what_not_to_say": [],
                "competitive_responses": []
            }
        })
        .to_string()
    }

    fn run_request(competitors: &[&str], skip_collection: bool) -> RunRequest {
        RunRequest {
            company: "Acme Bank".into(),
            website: "https://acme.example".into(),
            competitors: competitors.iter().map(|s| s.to_string()).collect(),
            skip_collection,
            model: "test-model".into(),
            repair_attempts: 1,
            date: NaiveDate::from_ymd_opt(2026, 2, 17).unwrap(),
        }
    }

    #[test]
    fn competitor_pairs_split_at_first_colon() {
        assert_eq!(
            parse_competitor_pair("Revolut:https://revolut.com"),
            Some(CompetitorTarget {
                name: "Revolut".into(),
                website: "https://revolut.com".into(),
            })
        );
        assert_eq!(
            parse_competitor_pair(" N26 : https://n26.com ").map(|t| t.name),
            Some("N26".to_string())
        );
        assert_eq!(parse_competitor_pair("Revolut"), None);
        assert_eq!(parse_competitor_pair(":https://x.example"), None);
        assert_eq!(parse_competitor_pair("Empty:"), None);
    }

    #[tokio::test]
    async fn full_run_writes_every_artifact() {
        let dir = temp_dir();
        let fetcher = StaticFetcher::new(&[
            ("https://acme.example", 600),
            ("https://acme.example/pricing", 400),
            ("https://revolut.example", 500),
        ]);
        let collector = Collector::new(fetcher, &collect_config());
        let client = ScriptedClient::new([brief_reply(&["Acme Bank", "Revolut"], &[])]);
        let corpus = ReferenceCorpus::default();
        let stages = Stages {
            collector: &collector,
            client: &client,
            corpus: &corpus,
            compositor: None,
            output_dir: &dir,
        };
        let progress = RecordingProgress::default();

        let summary = coordinate(
            &stages,
            &run_request(&["Revolut:https://revolut.example", "no-colon"], false),
            &progress,
        )
        .await
        .expect("run");

        assert!(dir.join("acme-bank-positioning.json").exists());
        assert!(dir.join("revolut-positioning.json").exists());
        assert_eq!(summary.brief_path, dir.join("acme-bank-brief.json"));
        assert_eq!(summary.document.html_path, dir.join("acme-bank-positioning-brief.html"));
        assert!(summary.document.pdf_path.is_none());
        assert_eq!(summary.competitors_included, vec!["Revolut".to_string()]);

        let target = read_scrape(&summary.scrape_path).unwrap();
        assert_eq!(target.pages.len(), 2);

        let content = &client.contents()[0];
        assert!(content.contains("Acme Bank"));
        assert!(content.contains("Revolut"));

        let markup = std::fs::read_to_string(&summary.document.html_path).unwrap();
        assert!(markup.contains("Acme &lt;b&gt;owns&lt;/b&gt; self-custody &amp; trust."));
        assert_eq!(markup.matches("class=\"company-card\"").count(), 2);

        let brief = read_brief(&summary.brief_path).unwrap();
        assert_eq!(brief.competitors(), vec!["Revolut".to_string()]);
        assert_eq!(brief.website().as_deref(), Some("https://acme.example"));

        assert_eq!(progress.pages.lock().unwrap().len(), 3);
        let phases = progress.phases.lock().unwrap().clone();
        assert_eq!(phases.first().map(String::as_str), Some("Collecting Acme Bank"));
        assert_eq!(phases.last().map(String::as_str), Some("Rendering document"));
        assert!(*progress.done.lock().unwrap());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn competitor_failure_is_absorbed() {
        let dir = temp_dir();
        let fetcher = StaticFetcher::new(&[("https://acme.example", 600)]);
        let collector = Collector::new(fetcher, &collect_config());
        let client = ScriptedClient::new([brief_reply(&["Acme Bank"], &[])]);
        let corpus = ReferenceCorpus::default();
        let stages = Stages {
            collector: &collector,
            client: &client,
            corpus: &corpus,
            compositor: None,
            output_dir: &dir,
        };

        let summary = coordinate(
            &stages,
            &run_request(&["Revolut:https://revolut.example"], false),
            &SilentProgress,
        )
        .await
        .expect("run survives competitor failure");

        assert_eq!(summary.competitors_failed, vec!["Revolut".to_string()]);
        assert!(summary.competitors_included.is_empty());
        assert!(!dir.join("revolut-positioning.json").exists());
        assert!(!client.contents()[0].contains("revolut.example"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_competitor_ignores_stale_artifact() {
        let dir = temp_dir();
        let mut stale = CompanyScrape::new("Revolut", "https://revolut.example");
        stale.pages.push(PageRecord {
            url: "https://revolut.example".into(),
            page_type: "homepage".into(),
            body_text: "STALE-REVOLUT-COPY".into(),
            ..Default::default()
        });
        write_json(&scrape_path(&dir, "revolut"), &stale).unwrap();

        let fetcher = StaticFetcher::new(&[("https://acme.example", 600)]);
        let collector = Collector::new(fetcher, &collect_config());
        let client = ScriptedClient::new([brief_reply(&["Acme Bank"], &[])]);
        let corpus = ReferenceCorpus::default();
        let stages = Stages {
            collector: &collector,
            client: &client,
            corpus: &corpus,
            compositor: None,
            output_dir: &dir,
        };

        let summary = coordinate(
            &stages,
            &run_request(&["Revolut:https://revolut.example"], false),
            &SilentProgress,
        )
        .await
        .expect("run");

        assert_eq!(summary.competitors_failed, vec!["Revolut".to_string()]);
        assert!(summary.competitors_included.is_empty());
        assert!(!client.contents()[0].contains("STALE-REVOLUT-COPY"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn competitor_sharing_target_slug_is_skipped() {
        let dir = temp_dir();
        let fetcher = StaticFetcher::new(&[
            ("https://acme.example", 600),
            ("https://other.example", 600),
        ]);
        let collector = Collector::new(fetcher, &collect_config());
        let client = ScriptedClient::new([brief_reply(&["Acme Bank"], &[])]);
        let corpus = ReferenceCorpus::default();
        let stages = Stages {
            collector: &collector,
            client: &client,
            corpus: &corpus,
            compositor: None,
            output_dir: &dir,
        };

        let summary = coordinate(
            &stages,
            &run_request(&["ACME bank:https://other.example"], false),
            &SilentProgress,
        )
        .await
        .expect("run");

        assert!(summary.competitors_included.is_empty());
        assert!(summary.competitors_failed.is_empty());
        let target = read_scrape(&summary.scrape_path).unwrap();
        assert_eq!(target.website, "https://acme.example");
        assert!(!client.contents()[0].contains("other.example"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn target_failure_aborts_before_generation() {
        let dir = temp_dir();
        let collector = Collector::new(StaticFetcher::new(&[]), &collect_config());
        let client = ScriptedClient::new([brief_reply(&["Acme Bank"], &[])]);
        let corpus = ReferenceCorpus::default();
        let stages = Stages {
            collector: &collector,
            client: &client,
            corpus: &corpus,
            compositor: None,
            output_dir: &dir,
        };

        let err = coordinate(&stages, &run_request(&[], false), &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, PositioningError::Transport(_)));
        assert_eq!(client.calls(), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn skipped_collection_needs_target_artifact() {
        let dir = temp_dir();
        let collector = Collector::new(StaticFetcher::new(&[]), &collect_config());
        let client = ScriptedClient::new(Vec::<String>::new());
        let corpus = ReferenceCorpus::default();
        let stages = Stages {
            collector: &collector,
            client: &client,
            corpus: &corpus,
            compositor: None,
            output_dir: &dir,
        };

        let err = coordinate(&stages, &run_request(&[], true), &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, PositioningError::InputNotFound { .. }));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn skipped_collection_uses_existing_artifacts() {
        let dir = temp_dir();
        let target = read_scrape(Path::new("../../../fixtures/json/acme-positioning.json")).unwrap();
        write_json(&scrape_path(&dir, "acme-bank"), &target).unwrap();

        let collector = Collector::new(StaticFetcher::new(&[]), &collect_config());
        let client = ScriptedClient::new([brief_reply(&["Acme Bank"], &["Revolut"])]);
        let corpus = ReferenceCorpus::default();
        let stages = Stages {
            collector: &collector,
            client: &client,
            corpus: &corpus,
            compositor: None,
            output_dir: &dir,
        };

        let summary = coordinate(
            &stages,
            &run_request(&["Revolut:https://revolut.example"], true),
            &SilentProgress,
        )
        .await
        .expect("run from artifacts");

        assert!(summary.competitors_included.is_empty());
        assert!(summary.competitors_failed.is_empty());
        assert_eq!(client.calls(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn synthesize_skips_missing_competitors_and_honors_output() {
        let dir = temp_dir();
        let input = PathBuf::from("../../../fixtures/json/acme-positioning.json");
        let output = dir.join("custom").join("brief.json");
        let client = ScriptedClient::new(["not json".to_string(), brief_reply(&["Acme Bank"], &[])]);

        let request = SynthesisRequest {
            input,
            competitor_slugs: vec!["ghost".into()],
            output: Some(output.clone()),
            model: "m".into(),
            repair_attempts: 1,
            date: NaiveDate::from_ymd_opt(2026, 2, 17).unwrap(),
        };
        let path = synthesize(&client, &ReferenceCorpus::default(), &dir, &request, &SilentProgress)
            .await
            .expect("synthesize");

        assert_eq!(path, output);
        assert_eq!(client.calls(), 2);
        let brief = read_brief(&path).unwrap();
        assert!(brief.competitors().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn render_falls_back_to_markup_when_compositor_missing() {
        let dir = temp_dir();
        let compositor = CommandCompositor::new("positioning-no-such-compositor");

        let document = render(
            Path::new("../../../fixtures/json/acme-brief.json"),
            &dir,
            Some(&compositor),
            &SilentProgress,
        )
        .expect("render");

        assert!(document.pdf_path.is_none());
        assert!(document.html_path.exists());
        assert!(document.markup.contains("Positioning Brief"));
        assert!(!document.markup.contains("<script>"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn render_missing_brief_is_input_not_found() {
        let err = render(
            &temp_dir().join("nobody-brief.json"),
            &temp_dir(),
            None,
            &SilentProgress,
        )
        .unwrap_err();
        assert!(matches!(err, PositioningError::InputNotFound { .. }));
    }
}
