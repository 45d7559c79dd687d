// src/scan/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Where a candidate was found. Serialized lowercase (`"youtube"`, `"x"`, ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
    X,
    Reddit,
    #[default]
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::X => "x",
            Platform::Reddit => "reddit",
            Platform::Web => "web",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovery record for a niche. An empty `url` means "no data".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub niche: String,
    pub velocity: f64,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub view_count: u64,
    pub platform: Platform,
}

impl Candidate {
    /// Placeholder emitted when a whole batch came back empty.
    pub fn placeholder(niche: &str) -> Self {
        Self {
            niche: niche.to_string(),
            velocity: 0.0,
            url: String::new(),
            thumbnail_url: String::new(),
            title: String::new(),
            view_count: 0,
            platform: Platform::default(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.url.is_empty()
    }
}

/// A content source that turns one niche into zero or more candidates.
///
/// Implementations return `Err` for network or decode failures; the scan
/// worker downgrades those to an empty result for the niche.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn search(&self, niche: &str) -> Result<Vec<Candidate>>;

    /// Disabled adapters are skipped by the worker without any I/O.
    fn enabled(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str;
}
