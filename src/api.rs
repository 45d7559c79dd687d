// src/api.rs
use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::forward::{self, ForwardReport, Forwarder};
use crate::scan::types::Candidate;
use crate::scan::Scanner;

#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<Scanner>,
    pub forwarder: Arc<dyn Forwarder>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/scan", post(scan))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct ScanReq {
    niches: Vec<String>,
    /// Forward non-placeholder candidates to the analyzer after the scan.
    #[serde(default)]
    forward: bool,
}

#[derive(serde::Serialize)]
struct ScanResp {
    candidates: Vec<Candidate>,
    degraded: bool,
    workers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    forward: Option<ForwardReport>,
}

async fn scan(State(state): State<AppState>, Json(body): Json<ScanReq>) -> Json<ScanResp> {
    let niches: Vec<String> = body
        .niches
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    let outcome = state.scanner.scan(&niches).await;

    let forward = if body.forward {
        Some(forward::forward_all(state.forwarder.as_ref(), &outcome.candidates).await)
    } else {
        None
    };

    Json(ScanResp {
        candidates: outcome.candidates,
        degraded: outcome.degraded,
        workers: outcome.workers_spawned,
        forward,
    })
}
