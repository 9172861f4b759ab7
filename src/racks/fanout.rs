//! Fan-out Fetcher: the same resource from the local node and every peer.
//!
//! All targets are polled concurrently on the calling task. Outcomes come
//! back in completion order; one target failing never touches another.

use std::collections::HashSet;

use futures_util::stream::{FuturesUnordered, StreamExt};
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::error::DashboardError;
use crate::utils::{join_path, normalize_base_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// This node's own API.
    Local,
    /// A discovered peer, by normalized base URL.
    Peer(String),
}

impl FetchTarget {
    /// Provenance tag for records fetched from this target.
    pub fn origin(&self) -> Option<&str> {
        match self {
            FetchTarget::Local => None,
            FetchTarget::Peer(url) => Some(url),
        }
    }

    fn base_url<'a>(&'a self, local_url: &'a str) -> &'a str {
        match self {
            FetchTarget::Local => local_url,
            FetchTarget::Peer(url) => url,
        }
    }
}

#[derive(Debug)]
pub struct EndpointOutcome<T> {
    pub origin: Option<String>,
    pub result: Result<T, String>,
}

/// Local first, then each distinct peer. A peer that is an alias of an
/// earlier peer, or of the local node, is skipped.
pub fn plan_targets<I, S>(local_url: &str, peers: I) -> Vec<FetchTarget>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    seen.insert(normalize_base_url(local_url));

    let mut targets = vec![FetchTarget::Local];
    for peer in peers {
        let key = normalize_base_url(peer.as_ref());
        if seen.insert(key.clone()) {
            targets.push(FetchTarget::Peer(key));
        } else {
            tracing::debug!("[FanOut] Skipping duplicate endpoint {}", peer.as_ref());
        }
    }
    targets
}

/// Fetches `resource_path` from every target and waits for all of them.
pub async fn fetch_from<T, I, S>(
    client: &reqwest::Client,
    local_url: &str,
    peers: I,
    resource_path: &str,
) -> Vec<EndpointOutcome<T>>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let targets = plan_targets(local_url, peers);
    tracing::debug!("[FanOut] GET {} from {} target(s)", resource_path, targets.len());

    let mut pending: FuturesUnordered<_> = targets
        .into_iter()
        .map(|target| async move {
            let result = match join_path(target.base_url(local_url), resource_path) {
                Ok(url) => fetch_json::<T>(client, url).await,
                Err(e) => Err(e),
            };
            let result = result.map_err(|e| {
                tracing::warn!("[FanOut] {}", e);
                e.to_string()
            });
            EndpointOutcome {
                origin: target.origin().map(str::to_string),
                result,
            }
        })
        .collect();

    let mut outcomes = Vec::with_capacity(pending.len());
    while let Some(outcome) = pending.next().await {
        outcomes.push(outcome);
    }
    outcomes
}

/// One GET with status check and JSON decode.
pub async fn fetch_json<T: DeserializeOwned>(client: &reqwest::Client, url: Url) -> Result<T, DashboardError> {
    let shown = url.to_string();

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DashboardError::Transport { url: shown.clone(), cause: describe_transport(e) })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DashboardError::Status {
            url: shown,
            reason: DashboardError::status_reason(status),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| DashboardError::Transport { url: shown.clone(), cause: describe_transport(e) })?;

    serde_json::from_slice(&body).map_err(|e| DashboardError::Decode { url: shown, cause: e.to_string() })
}

fn describe_transport(error: reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error.without_url())
    } else {
        error.without_url().to_string()
    }
}
