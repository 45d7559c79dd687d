// src/forward/analyzer.rs
use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use uuid::Uuid;

use super::{AnalyzePayload, ForwardStatus, Forwarder};
use crate::scan::types::Candidate;

/// Posts candidates to `{base}/discovery/analyze`. Single attempt per candidate.
#[derive(Clone)]
pub struct AnalyzerForwarder {
    endpoint: String,
    client: Client,
}

impl AnalyzerForwarder {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building forwarder http client")?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            endpoint: format!("{}/discovery/analyze", base_url.trim_end_matches('/')),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Forwarder for AnalyzerForwarder {
    async fn forward(&self, candidate: &Candidate) -> Result<ForwardStatus> {
        if candidate.is_placeholder() {
            tracing::debug!(target: "forward", niche = %candidate.niche, "skipping candidate without url");
            return Ok(ForwardStatus::Skipped);
        }

        let id = Uuid::new_v4();
        let payload = AnalyzePayload::new(candidate, id, chrono::Utc::now());

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .context("analyzer post")?;

        let status = resp.status();
        if status != StatusCode::OK {
            bail!("analyzer returned status: {status}");
        }

        tracing::info!(target: "forward", niche = %candidate.niche, id = %id, "candidate forwarded");
        Ok(ForwardStatus::Sent { id })
    }
}
