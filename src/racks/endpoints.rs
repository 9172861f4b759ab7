//! Endpoint Resolver: discovers the peer racks this node can reach.
//!
//! Resolution happens once per session. The resulting set is immutable and
//! handed to every consumer behind an `Arc`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DashboardError;
use crate::utils::join_path;

pub const OTHER_RACKS_PATH: &str = "history/other-racks";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RackEndpointSet {
    rack_urls: BTreeMap<String, String>,
    error: Option<String>,
    fetched_at: DateTime<Utc>,
}

impl RackEndpointSet {
    /// Entries with a blank URL are dropped.
    pub fn from_urls<I, K, V>(urls: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let rack_urls = urls
            .into_iter()
            .map(|(rack, url)| (rack.into(), url.into()))
            .filter(|(_, url)| !url.trim().is_empty())
            .collect();
        Self {
            rack_urls,
            error: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            rack_urls: BTreeMap::new(),
            error: Some(error.into()),
            fetched_at: Utc::now(),
        }
    }

    pub fn get(&self, rack: &str) -> Option<&str> {
        if self.error.is_some() {
            return None;
        }
        self.rack_urls.get(rack).map(String::as_str)
    }

    /// Peer base URLs ordered by rack id. Empty when discovery failed.
    pub fn peer_urls(&self) -> impl Iterator<Item = &str> {
        self.rack_urls.values().map(String::as_str)
    }

    pub fn rack_urls(&self) -> &BTreeMap<String, String> {
        &self.rack_urls
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_usable(&self) -> bool {
        self.error.is_none()
    }

    pub fn len(&self) -> usize {
        self.rack_urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rack_urls.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Asks the local synth-client which racks it knows about. Never fails: any
/// problem is carried as the set's error with an empty mapping.
pub async fn resolve(client: &reqwest::Client, local_url: &str) -> RackEndpointSet {
    let endpoints = match discover(client, local_url).await {
        Ok(urls) => RackEndpointSet::from_urls(urls),
        Err(error) => RackEndpointSet::failed(error),
    };

    match endpoints.error() {
        Some(error) => tracing::warn!("[Resolver] {}", error),
        None => tracing::info!("[Resolver] Discovered {} peer rack(s): {:?}", endpoints.len(), endpoints.rack_urls()),
    }
    endpoints
}

async fn discover(client: &reqwest::Client, local_url: &str) -> Result<BTreeMap<String, String>, String> {
    let url = join_path(local_url, OTHER_RACKS_PATH)
        .map_err(|e| format!("Failed to fetch synth-client endpoints: {}", e))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("Failed to fetch synth-client endpoints: {}", e.without_url()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!(
            "Failed to fetch synth-client endpoints: server responded with status {}",
            DashboardError::status_reason(status)
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| format!("Failed to fetch synth-client endpoints: {}", e.without_url()))?;

    serde_json::from_slice(&body).map_err(|e| format!("Failed to parse rack URLs: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_urls_are_dropped() {
        let set = RackEndpointSet::from_urls([("a", "http://rack-a"), ("b", "  "), ("c", "")]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a"), Some("http://rack-a"));
        assert!(set.get("b").is_none());
    }

    #[test]
    fn failed_set_is_empty_and_unusable() {
        let set = RackEndpointSet::failed("boom");
        assert!(!set.is_usable());
        assert!(set.is_empty());
        assert_eq!(set.error(), Some("boom"));
        assert_eq!(set.peer_urls().count(), 0);
    }
}
