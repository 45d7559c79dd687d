//! Trend discovery service: binary entrypoint.
//! Loads config, installs tracing + Prometheus, and serves the scan API.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_discovery::metrics::Metrics;
use trend_discovery::DiscoveryConfig;

/// `RUST_LOG` controls the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trend_discovery=info,scan=info,forward=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = DiscoveryConfig::load().context("loading discovery config")?;
    tracing::info!(
        primary_enabled = cfg.youtube_api_key.is_some(),
        max_workers = cfg.max_workers,
        analyzer = %cfg.analyzer_url,
        fallback_policy = ?cfg.fallback_policy,
        empty_batch_policy = ?cfg.empty_batch_policy,
        "discovery config loaded"
    );

    let metrics = Metrics::init()?;
    let app = trend_discovery::app(&cfg)?.merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "listening");

    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
