//! Latency time series for one path and their chart projection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;
use crate::racks::fanout::fetch_json;

pub const PERCENTILE_LABELS: [&str; 5] = ["50", "80", "90", "95", "99"];
const CHART_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Percentile series keyed by label (`"99"`), index-aligned with
/// `timestamps`. Timestamps travel as epoch milliseconds. A body without a
/// `percentiles` key has nothing to chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    #[serde(default, with = "epoch_millis")]
    pub timestamps: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub percentiles: Option<BTreeMap<String, Vec<Option<f64>>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub at: DateTime<Utc>,
    pub timestamp: String,
    pub p99: i64,
    pub p95: i64,
    pub p90: i64,
    pub p80: i64,
    pub p50: i64,
}

impl LatencySummary {
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Value of `label` at `index`; a missing series, index or `null` is 0.
    pub fn value_at(&self, label: &str, index: usize) -> f64 {
        self.percentiles
            .as_ref()
            .and_then(|percentiles| percentiles.get(label))
            .and_then(|series| series.get(index).copied().flatten())
            .unwrap_or(0.0)
    }

    /// True when every present series has exactly one value per timestamp.
    pub fn is_aligned(&self) -> bool {
        self.percentiles
            .iter()
            .flat_map(|percentiles| percentiles.values())
            .all(|s| s.len() == self.timestamps.len())
    }

    /// One point per timestamp, values rounded up to whole milliseconds.
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        if self.percentiles.is_none() {
            return Vec::new();
        }
        let ceil = |label: &str, index: usize| self.value_at(label, index).ceil() as i64;

        self.timestamps
            .iter()
            .enumerate()
            .map(|(i, at)| ChartPoint {
                at: *at,
                timestamp: at.format(CHART_LABEL_FORMAT).to_string(),
                p99: ceil("99", i),
                p95: ceil("95", i),
                p90: ceil("90", i),
                p80: ceil("80", i),
                p50: ceil("50", i),
            })
            .collect()
    }
}

/// What a detail view renders: the series, its chart, and any error. A
/// failed fetch yields an empty summary plus `error`, never an `Err`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyView {
    pub source_url: String,
    pub summary: LatencySummary,
    pub chart: Vec<ChartPoint>,
    pub error: Option<String>,
}

impl LatencyView {
    pub fn loaded(source_url: impl Into<String>, summary: LatencySummary) -> Self {
        let chart = summary.chart_points();
        Self {
            source_url: source_url.into(),
            summary,
            chart,
            error: None,
        }
    }

    pub fn failed(source_url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            summary: LatencySummary::default(),
            chart: Vec::new(),
            error: Some(error.into()),
        }
    }
}

pub async fn fetch_latency_summary(client: &reqwest::Client, url: Url) -> Result<LatencySummary, DashboardError> {
    fetch_json(client, url).await
}

mod epoch_millis {
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[DateTime<Utc>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|t| t.timestamp_millis()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<DateTime<Utc>>, D::Error> {
        Vec::<i64>::deserialize(deserializer)?
            .into_iter()
            .map(|ms| {
                DateTime::from_timestamp_millis(ms)
                    .ok_or_else(|| D::Error::custom(format!("timestamp {} out of range", ms)))
            })
            .collect()
    }
}
