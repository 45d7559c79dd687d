// tests/scan_pool.rs
//
// Worker pool, fallback policy and degradation, driven by scripted adapters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use trend_discovery::scan::scoring::classify_platform;
use trend_discovery::{Candidate, EmptyBatchPolicy, FallbackPolicy, Scanner, SourceAdapter};

type Script = Box<dyn Fn(&str) -> Result<Vec<Candidate>> + Send + Sync>;

struct Scripted {
    name: &'static str,
    enabled: bool,
    delay: Option<Duration>,
    script: Script,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Scripted {
    fn new(name: &'static str, script: Script) -> Self {
        Self {
            name,
            enabled: true,
            delay: None,
            script,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn empty(name: &'static str) -> Self {
        Self::new(name, Box::new(|_: &str| Ok(Vec::new())))
    }

    fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn with_delay(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SourceAdapter for Scripted {
    async fn search(&self, niche: &str) -> Result<Vec<Candidate>> {
        self.calls.lock().push(niche.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.script)(niche)
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

fn hit(niche: &str, url: &str, velocity: f64) -> Candidate {
    Candidate {
        niche: niche.to_string(),
        velocity,
        url: url.to_string(),
        thumbnail_url: String::new(),
        title: format!("{niche} hit"),
        view_count: 0,
        platform: classify_platform(url),
    }
}

fn niches(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn scanner(primary: &Arc<Scripted>, fallback: &Arc<Scripted>, max_workers: usize) -> Scanner {
    Scanner::new(primary.clone(), fallback.clone(), max_workers)
}

#[tokio::test]
async fn worker_count_is_min_of_cap_and_niches() {
    let primary = Arc::new(Scripted::new(
        "primary",
        Box::new(|n: &str| Ok(vec![hit(n, "https://youtu.be/x", 0.5)])),
    ));
    let fallback = Arc::new(Scripted::empty("fallback"));
    let s = scanner(&primary, &fallback, 50);

    for (cap, list, expected) in [
        (50usize, niches(&["a", "b", "c"]), 3usize),
        (2, niches(&["a", "b", "c", "d", "e"]), 2),
        (1, niches(&["a"]), 1),
        (0, niches(&["a", "b"]), 0),
        (4, Vec::new(), 0),
    ] {
        let d = s.dispatch(&list, cap).await;
        assert_eq!(d.workers_spawned, expected, "cap={cap} niches={}", list.len());
    }
}

#[tokio::test]
async fn empty_input_spawns_nothing_and_does_no_io() {
    let primary = Arc::new(Scripted::empty("primary"));
    let fallback = Arc::new(Scripted::empty("fallback"));
    let out = scanner(&primary, &fallback, 8).scan(&[]).await;

    assert!(out.candidates.is_empty());
    assert_eq!(out.workers_spawned, 0);
    assert!(!out.degraded);
    assert!(primary.calls().is_empty());
    assert!(fallback.calls().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_calls_never_exceed_cap() {
    let primary = Arc::new(
        Scripted::new(
            "primary",
            Box::new(|n: &str| Ok(vec![hit(n, "https://youtu.be/x", 0.7)])),
        )
        .with_delay(Duration::from_millis(20)),
    );
    let fallback = Arc::new(Scripted::empty("fallback"));
    let list: Vec<String> = (0..12).map(|i| format!("niche-{i}")).collect();

    let out = scanner(&primary, &fallback, 3).scan(&list).await;

    assert_eq!(out.workers_spawned, 3);
    assert_eq!(out.candidates.len(), 12);
    assert!(primary.max_in_flight.load(Ordering::SeqCst) <= 3);
    let mut seen = primary.calls();
    seen.sort();
    let mut want = list.clone();
    want.sort();
    assert_eq!(seen, want, "every niche is scanned exactly once");
    assert!(fallback.calls().is_empty(), "primary had results everywhere");
}

#[tokio::test]
async fn fallback_runs_only_when_primary_is_empty() {
    let primary = Arc::new(Scripted::new(
        "primary",
        Box::new(|n: &str| {
            if n == "cats" {
                Ok(vec![hit(n, "https://www.youtube.com/watch?v=c", 0.85)])
            } else {
                Ok(Vec::new())
            }
        }),
    ));
    let fallback = Arc::new(Scripted::new(
        "fallback",
        Box::new(|n: &str| Ok(vec![hit(n, "https://www.reddit.com/r/x", 0.5)])),
    ));

    let out = scanner(&primary, &fallback, 4)
        .scan(&niches(&["cats", "dogs"]))
        .await;

    assert_eq!(fallback.calls(), vec!["dogs".to_string()]);
    assert_eq!(out.candidates.len(), 2);
    let cats: Vec<_> = out.candidates.iter().filter(|c| c.niche == "cats").collect();
    assert_eq!(cats.len(), 1);
    assert!(cats[0].url.contains("youtube"));
}

#[tokio::test]
async fn always_policy_runs_fallback_after_primary() {
    let primary = Arc::new(Scripted::new(
        "primary",
        Box::new(|n: &str| Ok(vec![hit(n, "https://www.youtube.com/watch?v=p", 0.98)])),
    ));
    let fallback = Arc::new(Scripted::new(
        "fallback",
        Box::new(|n: &str| Ok(vec![hit(n, "https://blog.test/f", 0.5)])),
    ));

    let out = scanner(&primary, &fallback, 1)
        .with_policies(FallbackPolicy::Always, EmptyBatchPolicy::Placeholders)
        .scan(&niches(&["solo"]))
        .await;

    let urls: Vec<&str> = out.candidates.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://www.youtube.com/watch?v=p", "https://blog.test/f"],
        "primary results precede fallback results within a niche"
    );
}

#[tokio::test]
async fn disabled_primary_is_never_called() {
    let primary = Arc::new(
        Scripted::new(
            "primary",
            Box::new(|n: &str| Ok(vec![hit(n, "https://youtu.be/x", 0.5)])),
        )
        .disabled(),
    );
    let fallback = Arc::new(Scripted::new(
        "fallback",
        Box::new(|n: &str| Ok(vec![hit(n, "https://tiktok.com/@a", 0.5)])),
    ));

    let out = scanner(&primary, &fallback, 2)
        .scan(&niches(&["a", "b"]))
        .await;

    assert!(primary.calls().is_empty());
    assert_eq!(out.candidates.len(), 2);
}

#[tokio::test]
async fn adapter_errors_are_isolated_per_niche() {
    let primary = Arc::new(Scripted::new(
        "primary",
        Box::new(|n: &str| {
            if n == "broken" {
                Err(anyhow!("quota exceeded"))
            } else {
                Ok(vec![hit(n, "https://youtu.be/ok", 0.7)])
            }
        }),
    ));
    let fallback = Arc::new(Scripted::new(
        "fallback",
        Box::new(|n: &str| {
            if n == "broken" {
                Err(anyhow!("connection reset"))
            } else {
                Ok(Vec::new())
            }
        }),
    ));

    // One worker: the failing niche must not stop it from reaching the rest.
    let out = scanner(&primary, &fallback, 1)
        .scan(&niches(&["broken", "fine-1", "fine-2"]))
        .await;

    assert!(!out.degraded);
    assert_eq!(out.candidates.len(), 2);
    assert!(out.candidates.iter().all(|c| c.niche.starts_with("fine")));
    assert_eq!(fallback.calls(), vec!["broken".to_string()]);
}

#[tokio::test]
async fn empty_batch_yields_one_placeholder_per_niche() {
    let primary = Arc::new(Scripted::empty("primary"));
    let fallback = Arc::new(Scripted::empty("fallback"));

    let out = scanner(&primary, &fallback, 2)
        .scan(&niches(&["a", "b", "c"]))
        .await;

    assert!(out.degraded);
    assert_eq!(out.candidates.len(), 3);
    for (c, n) in out.candidates.iter().zip(["a", "b", "c"]) {
        assert_eq!(c.niche, n);
        assert_eq!(c.url, "");
        assert_eq!(c.velocity, 0.0);
    }
}

#[tokio::test]
async fn duplicate_niches_are_each_scanned() {
    let primary = Arc::new(Scripted::empty("primary"));
    let fallback = Arc::new(Scripted::empty("fallback"));

    let out = scanner(&primary, &fallback, 3)
        .scan(&niches(&["dup", "dup"]))
        .await;

    assert_eq!(fallback.calls().len(), 2);
    assert_eq!(out.candidates.len(), 2, "one placeholder per input entry");
}

#[tokio::test]
async fn rescan_policy_retries_fallback_sequentially() {
    // First pass: fallback fails for everything; rescan pass: succeeds.
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    let primary = Arc::new(Scripted::empty("primary").disabled());
    let fallback = Arc::new(Scripted::new(
        "fallback",
        Box::new(move |n: &str| {
            if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(anyhow!("temporarily blocked"))
            } else {
                Ok(vec![hit(n, "https://www.instagram.com/p/1", 0.5)])
            }
        }),
    ));

    let out = scanner(&primary, &fallback, 2)
        .with_policies(FallbackPolicy::OnEmptyPrimary, EmptyBatchPolicy::RescanFallback)
        .scan(&niches(&["x", "y"]))
        .await;

    assert!(!out.degraded);
    assert_eq!(out.candidates.len(), 2);
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn rescan_policy_still_degrades_when_nothing_found() {
    let primary = Arc::new(Scripted::empty("primary"));
    let fallback = Arc::new(Scripted::empty("fallback"));

    let out = scanner(&primary, &fallback, 2)
        .with_policies(FallbackPolicy::OnEmptyPrimary, EmptyBatchPolicy::RescanFallback)
        .scan(&niches(&["only"]))
        .await;

    assert!(out.degraded);
    assert_eq!(out.candidates.len(), 1);
    assert!(out.candidates[0].is_placeholder());
    assert_eq!(fallback.calls().len(), 2, "worker pass + rescan pass");
}
