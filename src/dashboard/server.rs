use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;

use crate::dashboard::models::{IntervalQuery, MessagePathsSnapshot};
use crate::dashboard::poller::RefreshPoller;
use crate::error::DashboardError;
use crate::racks::{DetailRoute, LatencyInterval, MessagePath};
use crate::DashboardEngine;

#[derive(Clone)]
pub struct DashboardState {
    pub engine: DashboardEngine,
    pub poller: RefreshPoller,
}

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/api/racks", get(get_racks))
        .route("/api/message-paths", get(get_message_paths))
        .route("/api/message-paths/refresh", post(refresh_message_paths))
        .route("/api/e2e-latencies/{from}/{via}/{to}", get(get_e2e_latencies))
        .route("/api/ack-latencies/{from}/{broker}", get(get_ack_latencies))
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Serves the dashboard API until `token` is cancelled.
pub async fn start_dashboard_server(
    state: DashboardState,
    addr: &str,
    token: CancellationToken,
) -> Result<(), DashboardError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|cause| DashboardError::Bind { addr: addr.to_string(), cause })?;

    tracing::info!("🌐 Dashboard available at http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
        .map_err(DashboardError::Server)
}

async fn get_racks(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(state.engine.endpoints.as_ref().clone())
}

async fn get_message_paths(State(state): State<DashboardState>) -> Response {
    // Before the first timer pass lands, run one inline.
    let snapshot = match state.poller.latest() {
        Some(result) => Some(result),
        None => state.poller.trigger().await,
    };
    match snapshot {
        Some(result) => Json(MessagePathsSnapshot::from(result.as_ref())).into_response(),
        None => shutting_down(),
    }
}

async fn refresh_message_paths(State(state): State<DashboardState>) -> Response {
    match state.poller.trigger().await {
        Some(result) => Json(MessagePathsSnapshot::from(result.as_ref())).into_response(),
        None => shutting_down(),
    }
}

async fn get_e2e_latencies(
    State(state): State<DashboardState>,
    Path((from_rack, via_rack, to_rack)): Path<(String, String, String)>,
    Query(query): Query<IntervalQuery>,
) -> Response {
    let route = DetailRoute::EndToEnd { from_rack, via_rack, to_rack };
    latency_response(&state, route, query).await
}

async fn get_ack_latencies(
    State(state): State<DashboardState>,
    Path((from_rack, broker_rack)): Path<(String, String)>,
    Query(query): Query<IntervalQuery>,
) -> Response {
    let route = DetailRoute::Ack { from_rack, broker_rack };
    latency_response(&state, route, query).await
}

async fn latency_response(state: &DashboardState, route: DetailRoute, query: IntervalQuery) -> Response {
    let interval = match LatencyInterval::parse(query.interval_start.as_deref(), query.interval_end.as_deref()) {
        Ok(interval) => interval,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    let latest = state.poller.latest();
    let records: &[MessagePath] = latest.as_deref().map(|r| r.records.as_slice()).unwrap_or(&[]);
    let view = state.engine.latency_view(records, &route, &interval).await;
    Json(view).into_response()
}

fn shutting_down() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Dashboard is shutting down").into_response()
}
