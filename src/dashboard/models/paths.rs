use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::racks::{AggregationResult, MessagePath};

/// Body of `GET /api/message-paths`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePathsSnapshot {
    pub records: Vec<MessagePath>,
    pub ack_paths: Vec<MessagePath>,
    pub failures: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl From<&AggregationResult> for MessagePathsSnapshot {
    fn from(result: &AggregationResult) -> Self {
        Self {
            records: result.records.clone(),
            ack_paths: result.ack_paths().into_iter().cloned().collect(),
            failures: result.failures.clone(),
            fetched_at: result.fetched_at,
        }
    }
}

/// Query string accepted by the latency endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct IntervalQuery {
    pub interval_start: Option<String>,
    pub interval_end: Option<String>,
}
