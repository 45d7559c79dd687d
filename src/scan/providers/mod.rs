// src/scan/providers/mod.rs
pub mod duckduckgo;
pub mod result_page;
pub mod youtube;

use anyhow::{Context, Result};
use std::time::Duration;

/// Shared HTTP client for source adapters. Every request carries `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("trend-discovery/0.1")
        .timeout(timeout)
        .build()
        .context("building source http client")
}
