mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use helpers::*;
use synth_dashboard::racks::resolve;
use synth_dashboard::DashboardEngine;

// =========================================================================================
// ENDPOINT RESOLVER
// =========================================================================================

mod resolver {
    use super::*;

    #[tokio::test]
    async fn test_resolves_rack_mapping() {
        let local = spawn_rack(other_racks_api(json!({
            "rack-a": "http://rack-a:8081",
            "rack-b": "http://rack-b:8081",
        })))
        .await;

        let endpoints = resolve(&reqwest::Client::new(), &local.url).await;

        assert!(endpoints.is_usable());
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints.get("rack-b"), Some("http://rack-b:8081"));
        let peers: Vec<_> = endpoints.peer_urls().collect();
        assert_eq!(peers, vec!["http://rack-a:8081", "http://rack-b:8081"]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_carried_as_error() {
        let local = spawn_rack(status_api("/history/other-racks", StatusCode::SERVICE_UNAVAILABLE)).await;

        let endpoints = resolve(&reqwest::Client::new(), &local.url).await;

        assert!(endpoints.is_empty());
        assert_eq!(
            endpoints.error(),
            Some("Failed to fetch synth-client endpoints: server responded with status 503 Service Unavailable")
        );
    }

    #[tokio::test]
    async fn test_unparsable_body_is_carried_as_error() {
        let local = spawn_rack(raw_api("/history/other-racks", "[\"not\", \"a\", \"map\"]")).await;

        let endpoints = resolve(&reqwest::Client::new(), &local.url).await;

        assert!(endpoints.is_empty());
        let error = endpoints.error().expect("parse failure should be reported");
        assert!(error.starts_with("Failed to parse rack URLs: "), "got: {}", error);
    }

    #[tokio::test]
    async fn test_unreachable_discovery_never_panics() {
        let endpoints = resolve(&reqwest::Client::new(), &dead_url().await).await;

        assert!(!endpoints.is_usable());
        assert!(endpoints.error().unwrap().starts_with("Failed to fetch synth-client endpoints"));
    }
}

// =========================================================================================
// ENGINE: discovery once, short-circuit on failure
// =========================================================================================

mod engine {
    use super::*;

    #[tokio::test]
    async fn test_connect_resolves_once_and_fans_out_to_peers() {
        let peer = spawn_rack(paths_api(json!([path_json("b", "x", "a", 4.0, None)]))).await;
        let local_router = other_racks_api(racks_json(&[("rack-b", peer.url.as_str())]))
            .merge(paths_api(json!([path_json("a", "x", "b", 3.0, Some(1.0))])));
        let local = spawn_rack(local_router).await;

        let engine = DashboardEngine::connect(synth_config(&local.url, 2_000)).await.unwrap();
        assert_eq!(engine.endpoints.len(), 1);

        let result = engine.refresh_message_paths().await;
        assert!(result.failures.is_empty(), "{:?}", result.failures);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].origin_base_url, None);
        assert_eq!(result.records[1].origin_base_url.as_deref(), Some(peer.url.as_str()));
    }

    #[tokio::test]
    async fn test_failed_discovery_short_circuits_fan_out() {
        let hits = Arc::new(AtomicUsize::new(0));
        let local_router = status_api("/history/other-racks", StatusCode::INTERNAL_SERVER_ERROR)
            .merge(message_paths_api(json!([path_json("a", "b", "c", 1.0, None)]), hits.clone()));
        let local = spawn_rack(local_router).await;

        let engine = DashboardEngine::connect(synth_config(&local.url, 2_000)).await.unwrap();
        let result = engine.refresh_message_paths().await;

        assert!(result.records.is_empty());
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].contains("500 Internal Server Error"));
        assert_eq!(hits.load(Ordering::SeqCst), 0, "fan-out must not run");
    }
}
