pub mod types;
pub mod endpoints;
pub mod fanout;
pub mod aggregate;
pub mod detail;
pub mod latency;

pub use types::{AggregationResult, MessagePath, MessagePathRecord};
pub use endpoints::{resolve, RackEndpointSet};
pub use fanout::{fetch_from, fetch_json, plan_targets, EndpointOutcome, FetchTarget};
pub use aggregate::{aggregate, aggregate_message_paths};
pub use detail::{route_detail_query, DetailRoute, DetailRouter, LatencyInterval, LatencyKind};
pub use latency::{fetch_latency_summary, ChartPoint, LatencySummary, LatencyView};
