// src/scan/providers/youtube.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Deserializer};

use crate::scan::scoring::score_velocity;
use crate::scan::types::{Candidate, Platform, SourceAdapter};

/// How many search hits are resolved per niche.
pub const SEARCH_MAX_RESULTS: u32 = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
struct Statistics {
    #[serde(rename = "viewCount", default, deserialize_with = "de_count")]
    view_count: u64,
}

/// The API encodes counts as decimal strings; accept plain numbers too.
fn de_count<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }
    match Option::<Raw>::deserialize(d)? {
        None => Ok(0),
        Some(Raw::Num(n)) => Ok(n),
        Some(Raw::Str(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Primary source: YouTube Data API v3. Disabled without an API key.
pub struct YoutubeAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
}

impl YoutubeAdapter {
    pub fn new(client: reqwest::Client, api_key: Option<String>, api_base: impl Into<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(target: "scan", "YOUTUBE_API_KEY not set - primary source disabled, search fallback only");
        }
        let mut api_base = api_base.into();
        while api_base.ends_with('/') {
            api_base.pop();
        }
        Self {
            client,
            api_key,
            api_base,
        }
    }

    async fn search_videos(&self, key: &str, niche: &str) -> Result<SearchResponse> {
        let max = SEARCH_MAX_RESULTS.to_string();
        self.client
            .get(format!("{}/search", self.api_base))
            .query(&[
                ("part", "snippet"),
                ("q", niche),
                ("type", "video"),
                ("order", "relevance"),
                ("maxResults", max.as_str()),
                ("key", key),
            ])
            .send()
            .await
            .context("youtube search get()")?
            .error_for_status()
            .context("youtube search non-2xx")?
            .json::<SearchResponse>()
            .await
            .context("youtube search json")
    }

    async fn view_count(&self, key: &str, video_id: &str) -> Result<u64> {
        let resp = self
            .client
            .get(format!("{}/videos", self.api_base))
            .query(&[
                ("part", "statistics,contentDetails"),
                ("id", video_id),
                ("key", key),
            ])
            .send()
            .await
            .context("youtube videos get()")?
            .error_for_status()
            .context("youtube videos non-2xx")?
            .json::<VideosResponse>()
            .await
            .context("youtube videos json")?;
        Ok(resp
            .items
            .first()
            .map(|v| v.statistics.view_count)
            .unwrap_or(0))
    }
}

#[async_trait]
impl SourceAdapter for YoutubeAdapter {
    async fn search(&self, niche: &str) -> Result<Vec<Candidate>> {
        let Some(key) = self.api_key.as_deref() else {
            return Ok(Vec::new());
        };

        // A failed search fails the whole niche; no partial results.
        let found = self.search_videos(key, niche).await?;

        let mut out = Vec::with_capacity(found.items.len());
        for item in found.items {
            let Some(video_id) = item.id.video_id else {
                continue;
            };
            let view_count = match self.view_count(key, &video_id).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(target: "scan", niche, video_id = %video_id, error = ?e, "skipping video: statistics lookup failed");
                    counter!("scan_stats_errors_total").increment(1);
                    continue;
                }
            };
            out.push(Candidate {
                niche: niche.to_string(),
                velocity: score_velocity(view_count),
                url: watch_url(&video_id),
                thumbnail_url: item
                    .snippet
                    .thumbnails
                    .default
                    .map(|t| t.url)
                    .unwrap_or_default(),
                title: item.snippet.title,
                view_count,
                platform: Platform::Youtube,
            });
        }
        Ok(out)
    }

    fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}
