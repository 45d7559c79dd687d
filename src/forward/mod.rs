// src/forward/mod.rs
pub mod analyzer;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::counter;
use serde::Serialize;
use uuid::Uuid;

use crate::scan::types::{Candidate, Platform};

pub use analyzer::AnalyzerForwarder;

/// Value of `metadata.source` on every forwarded payload.
pub const PAYLOAD_SOURCE: &str = "go-discovery";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PayloadMetadata {
    pub source: String,
    /// RFC 3339, UTC
    pub timestamp: String,
}

/// JSON body posted to the analysis service for one candidate.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyzePayload {
    pub id: String,
    pub url: String,
    pub niche: String,
    pub velocity: f64,
    pub thumbnail_url: String,
    pub title: String,
    pub view_count: u64,
    pub platform: Platform,
    pub metadata: PayloadMetadata,
}

impl AnalyzePayload {
    pub fn new(c: &Candidate, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            url: c.url.clone(),
            niche: c.niche.clone(),
            velocity: c.velocity,
            thumbnail_url: c.thumbnail_url.clone(),
            title: c.title.clone(),
            view_count: c.view_count,
            platform: c.platform,
            metadata: PayloadMetadata {
                source: PAYLOAD_SOURCE.to_string(),
                timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardStatus {
    Sent { id: Uuid },
    /// Placeholder candidate; nothing was sent.
    Skipped,
}

#[async_trait::async_trait]
pub trait Forwarder: Send + Sync {
    /// Send one candidate downstream. Empty-URL candidates are skipped
    /// without any I/O and reported as success.
    async fn forward(&self, candidate: &Candidate) -> Result<ForwardStatus>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ForwardFailure {
    pub niche: String,
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ForwardReport {
    pub sent: usize,
    pub skipped: usize,
    pub failures: Vec<ForwardFailure>,
}

/// Forward each candidate in order. A failure is recorded and the batch
/// continues; nothing is retried.
pub async fn forward_all(fwd: &dyn Forwarder, candidates: &[Candidate]) -> ForwardReport {
    let mut report = ForwardReport::default();
    for c in candidates {
        match fwd.forward(c).await {
            Ok(ForwardStatus::Sent { .. }) => {
                report.sent += 1;
                counter!("forward_sent_total").increment(1);
            }
            Ok(ForwardStatus::Skipped) => {
                report.skipped += 1;
                counter!("forward_skipped_total").increment(1);
            }
            Err(e) => {
                tracing::warn!(target: "forward", niche = %c.niche, url = %c.url, error = ?e, "forward failed");
                counter!("forward_failed_total").increment(1);
                report.failures.push(ForwardFailure {
                    niche: c.niche.clone(),
                    url: c.url.clone(),
                    error: format!("{e:#}"),
                });
            }
        }
    }
    report
}
