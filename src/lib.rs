// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod forward;
pub mod metrics;
pub mod scan;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::DiscoveryConfig;
pub use crate::forward::{forward_all, AnalyzerForwarder, ForwardReport, Forwarder};
pub use crate::scan::types::{Candidate, Platform, SourceAdapter};
pub use crate::scan::{EmptyBatchPolicy, FallbackPolicy, ScanOutcome, Scanner};

use std::sync::Arc;

/// Build the HTTP app (scan + health routes) from a config.
/// `/metrics` is added by the binary once the recorder is installed.
pub fn app(cfg: &DiscoveryConfig) -> anyhow::Result<axum::Router> {
    let scanner = Scanner::from_config(cfg)?;
    let forwarder = AnalyzerForwarder::new(&cfg.analyzer_url, cfg.request_timeout())?;
    let state = api::AppState {
        scanner: Arc::new(scanner),
        forwarder: Arc::new(forwarder),
    };
    Ok(api::router(state))
}
