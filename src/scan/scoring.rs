// src/scan/scoring.rs
//! Pure scoring helpers: view count → velocity, URL → platform.

use crate::scan::types::Platform;

/// Velocity assigned to scraped results on YouTube (no view count available).
pub const SCRAPED_YOUTUBE_VELOCITY: f64 = 0.7;
/// Velocity assigned to scraped results on any other platform.
pub const SCRAPED_OTHER_VELOCITY: f64 = 0.5;

/// Step function over view count. Monotonic non-decreasing.
pub fn score_velocity(view_count: u64) -> f64 {
    match view_count {
        v if v > 1_000_000 => 0.98,
        v if v > 100_000 => 0.85,
        v if v > 10_000 => 0.70,
        v if v > 1_000 => 0.50,
        _ => 0.30,
    }
}

/// Ordered substring checks; first match wins.
pub fn classify_platform(url: &str) -> Platform {
    const RULES: &[(&[&str], Platform)] = &[
        (&["youtube.com", "youtu.be"], Platform::Youtube),
        (&["tiktok.com"], Platform::Tiktok),
        (&["instagram.com"], Platform::Instagram),
        (&["twitter.com", "x.com"], Platform::X),
        (&["reddit.com"], Platform::Reddit),
    ];

    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| url.contains(n)))
        .map(|(_, p)| *p)
        .unwrap_or(Platform::Web)
}

/// Static estimate used by the scrape fallback.
pub fn scraped_velocity(platform: Platform) -> f64 {
    if platform == Platform::Youtube {
        SCRAPED_YOUTUBE_VELOCITY
    } else {
        SCRAPED_OTHER_VELOCITY
    }
}
