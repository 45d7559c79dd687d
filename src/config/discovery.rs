// src/config/discovery.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scan::{EmptyBatchPolicy, FallbackPolicy};

pub const ENV_CONFIG_PATH: &str = "DISCOVERY_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/discovery.toml";

pub const DEFAULT_YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_SEARCH_BASE: &str = "https://html.duckduckgo.com/html/";

fn default_analyzer_url() -> String {
    "http://api:8000".to_string()
}
fn default_max_workers() -> usize {
    50
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_youtube_api_base() -> String {
    DEFAULT_YOUTUBE_API_BASE.to_string()
}
fn default_search_base() -> String {
    DEFAULT_SEARCH_BASE.to_string()
}
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Run configuration. Built once at startup and passed into constructors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryConfig {
    /// YouTube Data API key. `None` disables the primary source.
    #[serde(default)]
    pub youtube_api_key: Option<String>,
    /// Base URL of the downstream analysis service.
    #[serde(default = "default_analyzer_url")]
    pub analyzer_url: String,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,
    #[serde(default)]
    pub empty_batch_policy: EmptyBatchPolicy,
    #[serde(default = "default_youtube_api_base")]
    pub youtube_api_base: String,
    #[serde(default = "default_search_base")]
    pub search_base: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            analyzer_url: default_analyzer_url(),
            max_workers: default_max_workers(),
            request_timeout_secs: default_request_timeout_secs(),
            fallback_policy: FallbackPolicy::default(),
            empty_batch_policy: EmptyBatchPolicy::default(),
            youtube_api_base: default_youtube_api_base(),
            search_base: default_search_base(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl DiscoveryConfig {
    /// Parse a TOML file. Missing keys fall back to defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading discovery config from {}", path.display()))?;
        let mut cfg: DiscoveryConfig = toml::from_str(&data)
            .with_context(|| format!("parsing discovery config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// File (from `$DISCOVERY_CONFIG_PATH` or `config/discovery.toml`, if present),
    /// then environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(PathBuf::from(p))?,
            Err(_) => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from_file(&p)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env();
        cfg.sanitize();
        Ok(cfg)
    }

    /// Environment overrides:
    /// YOUTUBE_API_KEY, PYTHON_API_URL, DISCOVERY_MAX_WORKERS,
    /// DISCOVERY_REQUEST_TIMEOUT_SECS, DISCOVERY_BIND_ADDR.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("YOUTUBE_API_KEY") {
            self.youtube_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("PYTHON_API_URL") {
            if !url.trim().is_empty() {
                self.analyzer_url = url;
            }
        }
        if let Some(n) = env_parse::<usize>("DISCOVERY_MAX_WORKERS") {
            self.max_workers = n;
        }
        if let Some(n) = env_parse::<u64>("DISCOVERY_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = n;
        }
        if let Ok(addr) = std::env::var("DISCOVERY_BIND_ADDR") {
            self.bind_addr = addr;
        }
    }

    fn sanitize(&mut self) {
        // An empty key is the same as no key.
        if self
            .youtube_api_key
            .as_deref()
            .is_some_and(|k| k.trim().is_empty())
        {
            self.youtube_api_key = None;
        }
        self.max_workers = self.max_workers.max(1);
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
        while self.analyzer_url.ends_with('/') {
            self.analyzer_url.pop();
        }
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring invalid numeric env value");
            None
        }
    }
}
