// src/scan/providers/duckduckgo.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::header::{ACCEPT, USER_AGENT};

use super::result_page::{DuckDuckGoHtmlParser, ResultLink, ResultPageParser};
use crate::scan::scoring::{classify_platform, scraped_velocity};
use crate::scan::types::{Candidate, SourceAdapter};

/// Upper bound on candidates taken from one result page.
pub const MAX_SCRAPED_RESULTS: usize = 10;

// The HTML endpoint rejects default client identities.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Credential-free fallback: scrapes a web search for "trending {niche} videos".
pub struct DuckDuckGoAdapter {
    client: reqwest::Client,
    search_base: String,
    parser: Box<dyn ResultPageParser>,
}

impl DuckDuckGoAdapter {
    pub fn new(client: reqwest::Client, search_base: impl Into<String>) -> Self {
        Self::with_parser(client, search_base, Box::new(DuckDuckGoHtmlParser))
    }

    pub fn with_parser(
        client: reqwest::Client,
        search_base: impl Into<String>,
        parser: Box<dyn ResultPageParser>,
    ) -> Self {
        Self {
            client,
            search_base: search_base.into(),
            parser,
        }
    }

    pub fn query_for(niche: &str) -> String {
        format!("trending {niche} videos")
    }

    async fn fetch_page(&self, niche: &str) -> Result<String> {
        // Form encoding turns spaces into '+'.
        let resp = self
            .client
            .get(&self.search_base)
            .query(&[("q", Self::query_for(niche))])
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, BROWSER_ACCEPT)
            .send()
            .await
            .context("search page get()")?
            .error_for_status()
            .context("search page non-2xx")?;
        resp.text().await.context("search page .text()")
    }
}

/// Turn parsed links into candidates: drop site-internal links, classify,
/// assign the static velocity and keep the first `MAX_SCRAPED_RESULTS`.
pub fn candidates_from_links(niche: &str, links: Vec<ResultLink>) -> Vec<Candidate> {
    links
        .into_iter()
        .filter(|l| !l.url.starts_with('/'))
        .take(MAX_SCRAPED_RESULTS)
        .map(|l| {
            let platform = classify_platform(&l.url);
            Candidate {
                niche: niche.to_string(),
                velocity: scraped_velocity(platform),
                url: l.url,
                thumbnail_url: String::new(),
                title: l.title,
                view_count: 0,
                platform,
            }
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for DuckDuckGoAdapter {
    async fn search(&self, niche: &str) -> Result<Vec<Candidate>> {
        tracing::info!(target: "scan", niche, "using search fallback");

        let html = self.fetch_page(niche).await?;

        let t0 = std::time::Instant::now();
        let links = self.parser.parse(&html);
        let out = candidates_from_links(niche, links);
        histogram!("scan_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("scan_scraped_results_total").increment(out.len() as u64);

        tracing::info!(target: "scan", niche, found = out.len(), "search fallback results");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}
