use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::SharedMonitor;
use crate::metrics::MonitorMetrics;

pub mod handlers;

/// Shared application state passed to handlers.
pub struct AppState {
    pub monitor: SharedMonitor,
    pub metrics: MonitorMetrics,
    /// Poll period of the live dashboard stream.
    pub render_interval: Duration,
}

/// Build the dashboard API router.
/// All routes are relative; the caller mounts this under `/api/v1`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chart", get(handlers::get_chart))
        .route("/chart/:dimension", get(handlers::get_chart_for_dimension))
        .route("/alerts", get(handlers::list_alerts))
        .route("/dimensions", get(handlers::list_dimensions))
        .route("/dimension", put(handlers::select_dimension))
        .route("/stream", get(handlers::stream_dashboard))
        .route("/reset", post(handlers::reset_session))
        .fallback(fallback_404)
}

/// Full application: health, metrics and the API, with tracing, CORS,
/// request-id and security-header layers.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/metrics", get(handlers::get_metrics))
        .nest("/api/v1", api_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Allows the configured dashboard origin (DASHBOARD_ORIGIN) plus localhost
/// for development.
fn cors_layer() -> CorsLayer {
    let dashboard_origin =
        std::env::var("DASHBOARD_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            origin_str == dashboard_origin
                || origin_str.starts_with("http://localhost:")
                || origin_str.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-request-id"),
        ])
}

/// Injects a unique X-Request-Id into every response.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    // live data, never cache
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    resp
}
