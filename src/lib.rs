pub mod config;
pub mod error;
pub mod racks;
pub mod dashboard;
pub mod utils;

use std::sync::Arc;

use crate::config::SynthConfig;
use crate::error::DashboardError;
use crate::racks::{
    aggregate_message_paths, fetch_latency_summary, resolve, AggregationResult, DetailRoute, DetailRouter,
    LatencyInterval, LatencyView, MessagePath, RackEndpointSet,
};

// ========================================
// ENGINE (one per dashboard session)
// ========================================

/// Shared handle for everything that talks to rack APIs.
/// Cheap to clone: the client is reference counted and the endpoint set
/// sits behind an `Arc`. The endpoint set never changes after `connect`.
#[derive(Clone)]
pub struct DashboardEngine {
    pub config: SynthConfig,
    pub client: reqwest::Client,
    pub endpoints: Arc<RackEndpointSet>,
}

impl DashboardEngine {
    /// Builds the HTTP client and runs discovery once.
    pub async fn connect(config: SynthConfig) -> Result<Self, DashboardError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(DashboardError::HttpClient)?;
        let endpoints = resolve(&client, &config.local_url).await;
        Ok(Self::with_endpoints(config, client, endpoints))
    }

    pub fn with_endpoints(config: SynthConfig, client: reqwest::Client, endpoints: RackEndpointSet) -> Self {
        Self {
            config,
            client,
            endpoints: Arc::new(endpoints),
        }
    }

    pub fn local_url(&self) -> &str {
        &self.config.local_url
    }

    /// One aggregation pass over the local node and every discovered peer.
    pub async fn refresh_message_paths(&self) -> AggregationResult {
        aggregate_message_paths(&self.client, self.local_url(), &self.endpoints).await
    }

    /// Loads the time series for `route` from whichever rack `records` says
    /// produced it.
    pub async fn latency_view(
        &self,
        records: &[MessagePath],
        route: &DetailRoute,
        interval: &LatencyInterval,
    ) -> LatencyView {
        let router = DetailRouter::new(records, &self.endpoints, self.local_url());
        let url = match router.route(route, interval) {
            Ok(url) => url,
            Err(e) => return LatencyView::failed(router.base_url_for(route), e.to_string()),
        };

        let shown = url.to_string();
        match fetch_latency_summary(&self.client, url).await {
            Ok(summary) => LatencyView::loaded(shown, summary),
            Err(e) => {
                tracing::warn!("[Engine] Failed to fetch {:?} latencies: {}", route.kind(), e);
                LatencyView::failed(shown, e.to_string())
            }
        }
    }
}
