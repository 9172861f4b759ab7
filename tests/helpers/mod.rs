#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::RawQuery;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use synth_dashboard::config::SynthConfig;
use synth_dashboard::racks::RackEndpointSet;
use synth_dashboard::DashboardEngine;

/// A fake synth-client API bound to an ephemeral port. Aborted on drop.
pub struct MockRack {
    pub url: String,
    handle: JoinHandle<()>,
}

impl Drop for MockRack {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_rack(router: Router) -> MockRack {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    MockRack { url: format!("http://{}", addr), handle }
}

/// A base URL nothing listens on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn path_json(from: &str, via: &str, to: &str, e2e: f64, ack: Option<f64>) -> Value {
    json!({
        "fromRack": from,
        "viaBrokerRack": via,
        "toRack": to,
        "latestEndToEndLatencyP99": e2e,
        "latestAckLatencyP99": ack,
    })
}

/// Serves `paths` on `/history/message-paths`, counting hits.
pub fn message_paths_api(paths: Value, hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/history/message-paths",
        get(move || {
            let paths = paths.clone();
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(paths)
            }
        }),
    )
}

pub fn paths_api(paths: Value) -> Router {
    message_paths_api(paths, Arc::new(AtomicUsize::new(0)))
}

pub fn other_racks_api(racks: Value) -> Router {
    Router::new().route(
        "/history/other-racks",
        get(move || {
            let racks = racks.clone();
            async move { Json(racks) }
        }),
    )
}

pub fn status_api(path: &'static str, status: StatusCode) -> Router {
    Router::new().route(path, get(move || async move { (status, "nope") }))
}

pub fn raw_api(path: &'static str, body: &'static str) -> Router {
    Router::new().route(path, get(move || async move { body }))
}

pub fn slow_api(path: &'static str, delay: Duration) -> Router {
    Router::new().route(
        path,
        get(move || async move {
            tokio::time::sleep(delay).await;
            Json(json!([]))
        }),
    )
}

/// Serves a latency summary on `path` and records each raw query string.
pub fn latency_api(path: &'static str, summary: Value, queries: Arc<Mutex<Vec<Option<String>>>>) -> Router {
    Router::new().route(
        path,
        get(move |RawQuery(query): RawQuery| {
            let summary = summary.clone();
            let queries = queries.clone();
            async move {
                queries.lock().unwrap().push(query);
                Json(summary)
            }
        }),
    )
}

pub fn synth_config(local_url: &str, timeout_ms: u64) -> SynthConfig {
    SynthConfig {
        local_url: local_url.to_string(),
        request_timeout_ms: timeout_ms,
    }
}

pub fn engine_with(local_url: &str, racks: &[(&str, &str)], timeout_ms: u64) -> DashboardEngine {
    let config = synth_config(local_url, timeout_ms);
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .unwrap();
    let endpoints = RackEndpointSet::from_urls(racks.iter().map(|(r, u)| (r.to_string(), u.to_string())));
    DashboardEngine::with_endpoints(config, client, endpoints)
}

pub fn racks_json(racks: &[(&str, &str)]) -> Value {
    let map: HashMap<_, _> = racks.iter().map(|(r, u)| (r.to_string(), u.to_string())).collect();
    json!(map)
}
