use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message path exactly as one rack's `/history/message-paths` returns it.
/// Older synth-client builds use the `latestP99…` field names.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePathRecord {
    pub from_rack: String,
    pub via_broker_rack: String,
    pub to_rack: String,
    #[serde(alias = "latestP99latency")]
    pub latest_end_to_end_latency_p99: f64,
    #[serde(default, alias = "latestP99AckLatency")]
    pub latest_ack_latency_p99: Option<f64>,
}

/// A message path tagged with the endpoint that reported it.
/// `origin_base_url` is `None` for the local node.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePath {
    pub from_rack: String,
    pub via_broker_rack: String,
    pub to_rack: String,
    pub latest_end_to_end_latency_p99: f64,
    pub latest_ack_latency_p99: Option<f64>,
    pub origin_base_url: Option<String>,
}

impl MessagePath {
    pub fn tagged(record: MessagePathRecord, origin: Option<String>) -> Self {
        Self {
            from_rack: record.from_rack,
            via_broker_rack: record.via_broker_rack,
            to_rack: record.to_rack,
            latest_end_to_end_latency_p99: record.latest_end_to_end_latency_p99,
            latest_ack_latency_p99: record.latest_ack_latency_p99,
            origin_base_url: origin,
        }
    }

    /// `fromRack -> viaBrokerRack -> toRack`
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.from_rack, &self.via_broker_rack, &self.to_rack)
    }

    pub fn has_ack_latency(&self) -> bool {
        matches!(self.latest_ack_latency_p99, Some(v) if v.is_finite())
    }
}

/// One merged view over every reachable rack.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub records: Vec<MessagePath>,
    pub failures: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl AggregationResult {
    /// Discovery failed, so nothing was fanned out.
    pub fn discovery_failed(error: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            failures: vec![error.into()],
            fetched_at: Utc::now(),
        }
    }

    /// Paths that carry an ack latency, in record order.
    pub fn ack_paths(&self) -> Vec<&MessagePath> {
        self.records.iter().filter(|p| p.has_ack_latency()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_legacy_field_names() {
        let json = r#"{"fromRack":"a","toRack":"c","viaBrokerRack":"b","latestP99latency":12.5,"latestP99AckLatency":3.0}"#;
        let record: MessagePathRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.latest_end_to_end_latency_p99, 12.5);
        assert_eq!(record.latest_ack_latency_p99, Some(3.0));
    }

    #[test]
    fn record_without_ack_latency() {
        let json = r#"{"fromRack":"a","toRack":"c","viaBrokerRack":"b","latestEndToEndLatencyP99":7,"latestAckLatencyP99":null}"#;
        let record: MessagePathRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.latest_ack_latency_p99, None);

        let json = r#"{"fromRack":"a","toRack":"c","viaBrokerRack":"b","latestEndToEndLatencyP99":7}"#;
        let record: MessagePathRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.latest_ack_latency_p99, None);
    }

    #[test]
    fn ack_paths_skip_missing_and_non_finite() {
        let path = |from: &str, ack: Option<f64>| MessagePath {
            from_rack: from.into(),
            via_broker_rack: "b".into(),
            to_rack: "c".into(),
            latest_end_to_end_latency_p99: 1.0,
            latest_ack_latency_p99: ack,
            origin_base_url: None,
        };
        let result = AggregationResult {
            records: vec![path("a", Some(2.0)), path("d", None), path("e", Some(f64::NAN))],
            failures: vec![],
            fetched_at: Utc::now(),
        };
        let ack: Vec<_> = result.ack_paths().iter().map(|p| p.from_rack.as_str()).collect();
        assert_eq!(ack, vec!["a"]);
    }
}
