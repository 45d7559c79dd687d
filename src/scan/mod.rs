// src/scan/mod.rs
//! Multi-source niche scan: a bounded pool of workers drains a pre-filled
//! niche queue, tries the primary source then the fallback, and streams
//! candidates into one output channel. The aggregate is finalized after every
//! worker has exited.

pub mod providers;
pub mod scoring;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};

use crate::config::DiscoveryConfig;
use crate::scan::providers::{duckduckgo::DuckDuckGoAdapter, http_client, youtube::YoutubeAdapter};
use crate::scan::types::{Candidate, SourceAdapter};

/// When the fallback source runs for a niche.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Only when the primary source produced nothing for the niche.
    #[default]
    OnEmptyPrimary,
    /// For every niche, after the primary source.
    Always,
}

/// What to do when the whole batch produced no candidates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptyBatchPolicy {
    /// One empty-URL placeholder per input niche.
    #[default]
    Placeholders,
    /// A sequential fallback-only pass over all niches; placeholders if that
    /// is empty too.
    RescanFallback,
}

/// Raw result of the worker pool, before degradation.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub candidates: Vec<Candidate>,
    pub workers_spawned: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    pub candidates: Vec<Candidate>,
    pub workers_spawned: usize,
    /// True when `candidates` are degradation placeholders.
    pub degraded: bool,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scan_runs_total", "Scan batches started.");
        describe_counter!("scan_niches_total", "Niches submitted for scanning.");
        describe_counter!(
            "scan_candidates_total",
            "Candidates emitted by workers (placeholders excluded)."
        );
        describe_counter!(
            "scan_adapter_errors_total",
            "Source adapter failures downgraded to empty results."
        );
        describe_counter!(
            "scan_stats_errors_total",
            "Per-video statistics lookups that failed and were skipped."
        );
        describe_counter!(
            "scan_scraped_results_total",
            "Candidates taken from search result pages."
        );
        describe_counter!(
            "scan_degraded_total",
            "Batches that ended with placeholders only."
        );
        describe_gauge!("scan_workers", "Workers spawned by the last batch.");
        describe_histogram!("scan_duration_ms", "Wall time of a scan batch in milliseconds.");
        describe_histogram!("scan_parse_ms", "Search page parse time in milliseconds.");
    });
}

#[derive(Clone)]
pub struct Scanner {
    primary: Arc<dyn SourceAdapter>,
    fallback: Arc<dyn SourceAdapter>,
    max_workers: usize,
    fallback_policy: FallbackPolicy,
    empty_batch_policy: EmptyBatchPolicy,
}

impl Scanner {
    pub fn new(
        primary: Arc<dyn SourceAdapter>,
        fallback: Arc<dyn SourceAdapter>,
        max_workers: usize,
    ) -> Self {
        Self {
            primary,
            fallback,
            max_workers,
            fallback_policy: FallbackPolicy::default(),
            empty_batch_policy: EmptyBatchPolicy::default(),
        }
    }

    pub fn with_policies(mut self, fallback: FallbackPolicy, empty_batch: EmptyBatchPolicy) -> Self {
        self.fallback_policy = fallback;
        self.empty_batch_policy = empty_batch;
        self
    }

    /// YouTube as primary, DuckDuckGo HTML as fallback.
    pub fn from_config(cfg: &DiscoveryConfig) -> Result<Self> {
        let client = http_client(cfg.request_timeout())?;
        let primary = YoutubeAdapter::new(
            client.clone(),
            cfg.youtube_api_key.clone(),
            cfg.youtube_api_base.clone(),
        );
        let fallback = DuckDuckGoAdapter::new(client, cfg.search_base.clone());
        Ok(Self::new(Arc::new(primary), Arc::new(fallback), cfg.max_workers)
            .with_policies(cfg.fallback_policy, cfg.empty_batch_policy))
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Scan with the configured worker cap.
    pub async fn scan(&self, niches: &[String]) -> ScanOutcome {
        self.scan_with_cap(niches, self.max_workers).await
    }

    /// Dispatch, then apply the empty-batch policy. Never fails; for a
    /// non-empty input the result is never empty.
    pub async fn scan_with_cap(&self, niches: &[String], cap: usize) -> ScanOutcome {
        ensure_metrics_described();
        let t0 = std::time::Instant::now();
        counter!("scan_runs_total").increment(1);
        counter!("scan_niches_total").increment(niches.len() as u64);

        let dispatch = self.dispatch(niches, cap).await;
        counter!("scan_candidates_total").increment(dispatch.candidates.len() as u64);

        let (candidates, degraded) = self.aggregate(niches, dispatch.candidates).await;
        if degraded {
            counter!("scan_degraded_total").increment(1);
        }

        histogram!("scan_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::info!(
            target: "scan",
            niches = niches.len(),
            workers = dispatch.workers_spawned,
            candidates = candidates.len(),
            degraded,
            "scan finished"
        );

        ScanOutcome {
            candidates,
            workers_spawned: dispatch.workers_spawned,
            degraded,
        }
    }

    /// Run `min(cap, niches.len())` workers over a pre-filled queue and
    /// collect everything they emitted. No degradation is applied here.
    pub async fn dispatch(&self, niches: &[String], cap: usize) -> Dispatch {
        let workers = cap.min(niches.len());
        gauge!("scan_workers").set(workers as f64);
        if workers == 0 {
            return Dispatch::default();
        }

        // Fill and close the queue before any worker reads.
        let (queue_tx, queue_rx) = mpsc::channel::<String>(niches.len());
        for n in niches {
            if queue_tx.send(n.clone()).await.is_err() {
                break;
            }
        }
        drop(queue_tx);
        let queue = Arc::new(Mutex::new(queue_rx));

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Candidate>();

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let unit = Worker {
                id: worker_id,
                queue: Arc::clone(&queue),
                out: out_tx.clone(),
                primary: Arc::clone(&self.primary),
                fallback: Arc::clone(&self.fallback),
                policy: self.fallback_policy,
            };
            handles.push(tokio::spawn(unit.run()));
        }
        drop(out_tx);

        for h in handles {
            if let Err(e) = h.await {
                tracing::warn!(target: "scan", error = ?e, "scan worker aborted");
            }
        }

        let mut candidates = Vec::new();
        while let Some(c) = out_rx.recv().await {
            candidates.push(c);
        }

        Dispatch {
            candidates,
            workers_spawned: workers,
        }
    }

    async fn aggregate(&self, niches: &[String], emitted: Vec<Candidate>) -> (Vec<Candidate>, bool) {
        if !emitted.is_empty() || niches.is_empty() {
            return (emitted, false);
        }

        if self.empty_batch_policy == EmptyBatchPolicy::RescanFallback {
            tracing::info!(target: "scan", "no results from workers, rescanning with fallback");
            let mut rescued = Vec::new();
            for n in niches {
                rescued.extend(search_isolated(self.fallback.as_ref(), n).await);
            }
            if !rescued.is_empty() {
                return (rescued, false);
            }
        }

        tracing::warn!(target: "scan", niches = niches.len(), "no source produced data, emitting placeholders");
        (degrade(niches), true)
    }
}

/// One placeholder per niche, in input order.
pub fn degrade(niches: &[String]) -> Vec<Candidate> {
    niches.iter().map(|n| Candidate::placeholder(n)).collect()
}

/// Call an adapter and downgrade any error to an empty result.
pub async fn search_isolated(adapter: &dyn SourceAdapter, niche: &str) -> Vec<Candidate> {
    match adapter.search(niche).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "scan", error = ?e, adapter = adapter.name(), niche, "source error");
            counter!("scan_adapter_errors_total", "adapter" => adapter.name()).increment(1);
            Vec::new()
        }
    }
}

struct Worker {
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
    out: mpsc::UnboundedSender<Candidate>,
    primary: Arc<dyn SourceAdapter>,
    fallback: Arc<dyn SourceAdapter>,
    policy: FallbackPolicy,
}

impl Worker {
    async fn run(self) {
        loop {
            // Queue is closed and pre-filled: recv never waits on a producer.
            let next = { self.queue.lock().await.recv().await };
            let Some(niche) = next else {
                break;
            };
            let emitted = self.scan_niche(&niche).await;
            tracing::debug!(target: "scan", worker = self.id, niche = %niche, emitted, "niche done");
        }
    }

    async fn scan_niche(&self, niche: &str) -> usize {
        let mut emitted = 0usize;

        if self.primary.enabled() {
            for c in search_isolated(self.primary.as_ref(), niche).await {
                emitted += self.emit(c);
            }
        }

        let run_fallback = match self.policy {
            FallbackPolicy::OnEmptyPrimary => emitted == 0,
            FallbackPolicy::Always => true,
        };
        if run_fallback {
            for c in search_isolated(self.fallback.as_ref(), niche).await {
                emitted += self.emit(c);
            }
        }

        emitted
    }

    fn emit(&self, c: Candidate) -> usize {
        usize::from(self.out.send(c).is_ok())
    }
}
