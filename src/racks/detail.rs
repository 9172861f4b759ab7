//! Detail Router: sends a drill-down query to the rack that produced the
//! selected path instead of the local node.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::Serialize;

use crate::error::DashboardError;
use crate::racks::endpoints::RackEndpointSet;
use crate::racks::types::MessagePath;
use crate::utils::{normalize_base_url, resource_url};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyKind {
    E2e,
    Ack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailRoute {
    EndToEnd { from_rack: String, via_rack: String, to_rack: String },
    Ack { from_rack: String, broker_rack: String },
}

impl DetailRoute {
    pub fn for_record(record: &MessagePath, kind: LatencyKind) -> Self {
        match kind {
            LatencyKind::E2e => DetailRoute::EndToEnd {
                from_rack: record.from_rack.clone(),
                via_rack: record.via_broker_rack.clone(),
                to_rack: record.to_rack.clone(),
            },
            LatencyKind::Ack => DetailRoute::Ack {
                from_rack: record.from_rack.clone(),
                broker_rack: record.via_broker_rack.clone(),
            },
        }
    }

    pub fn kind(&self) -> LatencyKind {
        match self {
            DetailRoute::EndToEnd { .. } => LatencyKind::E2e,
            DetailRoute::Ack { .. } => LatencyKind::Ack,
        }
    }

    /// The rack whose locally observed metric is being drilled into:
    /// the receiving rack for e2e, the producing rack for ack.
    pub fn anchor_rack(&self) -> &str {
        match self {
            DetailRoute::EndToEnd { to_rack, .. } => to_rack.as_str(),
            DetailRoute::Ack { from_rack, .. } => from_rack.as_str(),
        }
    }

    pub fn segments(&self) -> Vec<&str> {
        match self {
            DetailRoute::EndToEnd { from_rack, via_rack, to_rack } => {
                vec!["history", "e2e-latencies", from_rack.as_str(), via_rack.as_str(), to_rack.as_str()]
            }
            DetailRoute::Ack { from_rack, broker_rack } => {
                vec!["history", "ack-latencies", from_rack.as_str(), broker_rack.as_str()]
            }
        }
    }

    pub fn matches(&self, record: &MessagePath) -> bool {
        match self {
            DetailRoute::EndToEnd { from_rack, via_rack, to_rack } => {
                record.key() == (from_rack.as_str(), via_rack.as_str(), to_rack.as_str())
            }
            DetailRoute::Ack { from_rack, broker_rack } => {
                record.from_rack == *from_rack && record.via_broker_rack == *broker_rack
            }
        }
    }
}

/// Optional bounds on a detail query. Absent bounds are not sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyInterval {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl LatencyInterval {
    /// Parses RFC 3339 bounds; empty strings count as absent.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, String> {
        Ok(Self {
            start: parse_bound("interval_start", start)?,
            end: parse_bound("interval_end", end)?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    fn append_to(&self, url: &mut Url) {
        if self.is_unbounded() {
            return;
        }
        let mut query = url.query_pairs_mut();
        if let Some(start) = &self.start {
            query.append_pair("interval_start", &encode_instant(start));
        }
        if let Some(end) = &self.end {
            query.append_pair("interval_end", &encode_instant(end));
        }
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| format!("Invalid {} '{}': {}", name, s, e)),
    }
}

/// `2024-01-01T10:00:00.000Z`
pub fn encode_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn build_detail_url(base: &str, route: &DetailRoute, interval: &LatencyInterval) -> Result<Url, DashboardError> {
    let mut url = resource_url(base, route.segments())?;
    interval.append_to(&mut url);
    Ok(url)
}

/// Direct form: the selected record's own origin, or the local node when the
/// record came from there.
pub fn route_detail_query(
    record: &MessagePath,
    kind: LatencyKind,
    interval: &LatencyInterval,
    local_url: &str,
) -> Result<Url, DashboardError> {
    let base = record.origin_base_url.as_deref().unwrap_or(local_url);
    build_detail_url(base, &DetailRoute::for_record(record, kind), interval)
}

/// Resolves a route that only names racks (a followed link, a bookmarked
/// URL) against the latest aggregation and the discovered endpoints.
pub struct DetailRouter<'a> {
    records: &'a [MessagePath],
    endpoints: &'a RackEndpointSet,
    local_url: &'a str,
}

impl<'a> DetailRouter<'a> {
    pub fn new(records: &'a [MessagePath], endpoints: &'a RackEndpointSet, local_url: &'a str) -> Self {
        Self { records, endpoints, local_url }
    }

    /// Base URL to query, in order of preference: a matching record from the
    /// anchor rack's endpoint, any matching record, the anchor rack's
    /// endpoint, the local node.
    pub fn base_url_for(&self, route: &DetailRoute) -> &'a str {
        let anchor_url = self.endpoints.get(route.anchor_rack());
        let anchor_key = anchor_url.map(normalize_base_url);
        let candidates: Vec<&'a MessagePath> = self.records.iter().filter(|r| route.matches(r)).collect();

        if let Some(key) = anchor_key.as_deref() {
            let own = candidates
                .iter()
                .copied()
                .filter_map(|r| r.origin_base_url.as_deref())
                .find(|origin| *origin == key);
            if let Some(origin) = own {
                return origin;
            }
        }
        if let Some(first) = candidates.first().copied() {
            return first.origin_base_url.as_deref().unwrap_or(self.local_url);
        }
        if let Some(url) = anchor_url {
            return url;
        }
        tracing::debug!("[DetailRouter] No origin for {:?}, using local node", route);
        self.local_url
    }

    pub fn route(&self, route: &DetailRoute, interval: &LatencyInterval) -> Result<Url, DashboardError> {
        build_detail_url(self.base_url_for(route), route, interval)
    }
}
