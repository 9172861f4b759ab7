//! Aggregator: merges per-endpoint outcomes into one ordered view.

use chrono::Utc;

use crate::racks::endpoints::RackEndpointSet;
use crate::racks::fanout::{fetch_from, EndpointOutcome};
use crate::racks::types::{AggregationResult, MessagePath, MessagePathRecord};

pub const MESSAGE_PATHS_PATH: &str = "history/message-paths";

/// Tags, concatenates and sorts every successful batch; failures are kept
/// as-is. Records sharing a key but coming from different origins are both
/// kept.
pub fn aggregate(outcomes: Vec<EndpointOutcome<Vec<MessagePathRecord>>>) -> AggregationResult {
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for EndpointOutcome { origin, result } in outcomes {
        match result {
            Ok(batch) => {
                records.extend(batch.into_iter().map(|record| MessagePath::tagged(record, origin.clone())));
            }
            Err(failure) => failures.push(failure),
        }
    }

    // Origin breaks ties so equal keys do not swap places between polls.
    records.sort_by(|a, b| {
        a.key()
            .cmp(&b.key())
            .then_with(|| a.origin_base_url.cmp(&b.origin_base_url))
    });

    tracing::debug!("[Aggregator] {} record(s), {} failure(s)", records.len(), failures.len());

    AggregationResult {
        records,
        failures,
        fetched_at: Utc::now(),
    }
}

/// One full pass: short-circuits on a failed discovery, otherwise fans out
/// `/history/message-paths` and aggregates.
pub async fn aggregate_message_paths(
    client: &reqwest::Client,
    local_url: &str,
    endpoints: &RackEndpointSet,
) -> AggregationResult {
    if let Some(error) = endpoints.error() {
        tracing::warn!("[Aggregator] Discovery failed, skipping fan-out: {}", error);
        return AggregationResult::discovery_failed(error);
    }

    let outcomes = fetch_from(client, local_url, endpoints.peer_urls(), MESSAGE_PATHS_PATH).await;
    aggregate(outcomes)
}
