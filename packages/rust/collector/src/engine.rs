//! Sequential per-company collector.
//!
//! Fetches a fixed list of site paths one after another, applying the
//! de-duplication, thin-content and homepage-failure rules, and returns
//! the [`CompanyScrape`] artifact for that company.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use positioning_shared::{
    CollectConfig, CompanyScrape, PageRecord, PageTarget, PositioningError, Result,
};

use crate::extract::extract_page;

// ---------------------------------------------------------------------------
// Fetch capability
// ---------------------------------------------------------------------------

/// Loads one page and returns its extracted record.
///
/// Failures never surface as `Err`: they are carried in
/// [`PageRecord::error`] so the collector can decide how much they matter.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str, page_type: &str) -> impl Future<Output = PageRecord> + Send;
}

/// HTTP fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: Client,
    /// Pause after each successful load, before extraction.
    settle: Duration,
}

impl HttpFetcher {
    pub fn new(config: &CollectConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.page_timeout)
            .build()
            .map_err(|e| {
                PositioningError::Transport(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            settle: config.settle,
        })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, page_type: &str) -> PageRecord {
        debug!(url, page_type, "fetching page");

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return PageRecord::failed(url, page_type, e.to_string()),
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            return PageRecord::failed(url, page_type, format!("HTTP {}", status.as_u16()));
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return PageRecord::failed(url, page_type, format!("body read failed: {e}"));
            }
        };

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        extract_page(&body, url, page_type)
    }
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

pub struct Collector<F> {
    fetcher: F,
    pages: Vec<PageTarget>,
    min_body_chars: usize,
}

impl Collector<HttpFetcher> {
    /// Collector over HTTP with the configured page list.
    pub fn from_config(config: &CollectConfig) -> Result<Self> {
        Ok(Self::new(HttpFetcher::new(config)?, config))
    }
}

impl<F: PageFetcher> Collector<F> {
    pub fn new(fetcher: F, config: &CollectConfig) -> Self {
        Self {
            fetcher,
            pages: config.pages.clone(),
            min_body_chars: config.min_body_chars,
        }
    }

    /// Collect one company's site. `on_page` sees every kept page as it lands.
    ///
    /// Fails with `Transport` when the homepage cannot be collected and with
    /// `Config` when `website` is not an http(s) URL.
    #[instrument(skip_all, fields(company = %company, website = %website))]
    pub async fn collect(
        &self,
        company: &str,
        website: &str,
        mut on_page: impl FnMut(&PageRecord) + Send,
    ) -> Result<CompanyScrape> {
        let root = normalize_website(website)?;
        let mut scrape = CompanyScrape::new(company, root.clone());
        let mut seen_types: HashSet<&str> = HashSet::new();

        info!(pages = self.pages.len(), "collecting site");

        for target in &self.pages {
            let homepage = target.page_type == positioning_shared::HOMEPAGE;
            if !homepage && seen_types.contains(target.page_type.as_str()) {
                debug!(page_type = %target.page_type, path = %target.path, "page type already collected");
                continue;
            }

            let url = format!("{root}{}", target.path);
            let record = self.fetcher.fetch(&url, &target.page_type).await;

            if let Some(error) = &record.error {
                if homepage {
                    return Err(PositioningError::Transport(format!(
                        "homepage {url} could not be collected: {error}"
                    )));
                }
                warn!(%url, %error, "page skipped");
                continue;
            }

            let body_chars = record.body_chars();
            if !homepage && body_chars < self.min_body_chars {
                info!(%url, body_chars, "thin content, page skipped");
                continue;
            }

            info!(
                %url,
                page_type = %record.page_type,
                body_chars,
                headings = record.headings.len(),
                ctas = record.cta_texts.len(),
                "page collected"
            );

            seen_types.insert(target.page_type.as_str());
            on_page(&record);
            scrape.pages.push(record);
        }

        info!(pages = scrape.pages.len(), "collection complete");
        Ok(scrape)
    }
}

/// Validate the website and strip trailing slashes so paths append cleanly.
fn normalize_website(website: &str) -> Result<String> {
    let trimmed = website.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| PositioningError::config(format!("invalid website URL '{trimmed}': {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(PositioningError::config(format!(
            "website must be an http(s) URL, got '{trimmed}'"
        )));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
