use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::engine::DimensionsView;
use crate::errors::AppError;
use crate::models::{AlertCard, ChartView};

#[derive(Debug, Deserialize)]
pub struct SelectDimensionRequest {
    pub dimension: String,
}

/// GET /api/v1/chart: chart view for the active dimension
pub async fn get_chart(State(state): State<Arc<AppState>>) -> Json<ChartView> {
    Json(state.monitor.chart().await)
}

/// GET /api/v1/chart/:dimension: chart view for any configured dimension
pub async fn get_chart_for_dimension(
    State(state): State<Arc<AppState>>,
    Path(dimension): Path<String>,
) -> Result<Json<ChartView>, AppError> {
    state
        .monitor
        .chart_for(&dimension)
        .await
        .map(Json)
        .ok_or(AppError::UnknownDimension(dimension))
}

/// GET /api/v1/alerts: most recent alerts, newest first
pub async fn list_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<AlertCard>> {
    Json(state.monitor.alert_cards().await)
}

/// GET /api/v1/dimensions
pub async fn list_dimensions(State(state): State<Arc<AppState>>) -> Json<DimensionsView> {
    Json(state.monitor.dimensions().await)
}

/// PUT /api/v1/dimension: switch the active dimension
pub async fn select_dimension(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectDimensionRequest>,
) -> Result<Json<DimensionsView>, AppError> {
    if !state.monitor.select(&req.dimension).await {
        tracing::warn!(dimension = %req.dimension, "rejected selection of unconfigured dimension");
        return Err(AppError::SelectionRejected(req.dimension));
    }
    tracing::info!(dimension = %req.dimension, "active dimension changed");
    Ok(Json(state.monitor.dimensions().await))
}

/// POST /api/v1/reset: drop window and alerts, as on a fresh feed session
pub async fn reset_session(State(state): State<Arc<AppState>>) -> StatusCode {
    state.monitor.reset().await;
    tracing::info!("monitor state reset on request");
    StatusCode::NO_CONTENT
}

/// GET /metrics: Prometheus text format
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (window, alerts) = state.monitor.sizes().await;
    state.metrics.observe_sizes(window, alerts);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.encode(),
    )
}

/// GET /api/v1/stream: SSE stream of dashboard snapshots.
///
/// The first snapshot is sent immediately. After that the monitor is polled
/// every render interval and a snapshot is sent only if the revision moved,
/// so bursts of events collapse into one render.
pub async fn stream_dashboard(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = stream::unfold(
        (state, None::<u64>, false),
        |(state, last_revision, started)| async move {
            if started {
                tokio::time::sleep(state.render_interval).await;
            }

            let revision = state.monitor.revision().await;
            if last_revision == Some(revision) {
                return Some((Ok(heartbeat()), (state, last_revision, true)));
            }

            let snapshot = state.monitor.dashboard().await;
            match dashboard_event(&snapshot) {
                Some(event) => Some((Ok(event), (state, Some(snapshot.revision), true))),
                // retry on the next tick
                None => Some((Ok(heartbeat()), (state, last_revision, true))),
            }
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn heartbeat() -> Event {
    Event::default().comment("heartbeat")
}

/// `None` (and an error log) if the payload cannot be serialized.
fn dashboard_event<T: Serialize>(payload: &T) -> Option<Event> {
    match serde_json::to_string(payload) {
        Ok(data) => Some(Event::default().event("dashboard").data(data)),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize dashboard snapshot");
            None
        }
    }
}
