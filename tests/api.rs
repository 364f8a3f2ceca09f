//! Dashboard HTTP API, driven in-process through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use payment_monitor::api::{self, AppState};
use payment_monitor::engine::{Monitor, MonitorSettings, SharedMonitor};
use payment_monitor::metrics::MonitorMetrics;

fn setup() -> (Router, SharedMonitor) {
    let monitor = SharedMonitor::new(Monitor::new(&MonitorSettings::default()).unwrap());
    let state = Arc::new(AppState {
        monitor: monitor.clone(),
        metrics: MonitorMetrics::new().unwrap(),
        render_interval: Duration::from_millis(20),
    });
    (api::app(state), monitor)
}

async fn seed(monitor: &SharedMonitor) {
    let frames = [
        json!({"type":"metrics","timestamp":"2024-05-01T12:00:00Z","dimension":"gateway","value":"stripe","success_rate":99.1}),
        json!({"type":"metrics","timestamp":"2024-05-01T12:00:00Z","dimension":"gateway","value":"adyen","success_rate":95.0}),
        json!({"type":"metrics","timestamp":"2024-05-01T12:00:01Z","dimension":"gateway","value":"stripe","success_rate":97.3}),
        json!({"type":"metrics","timestamp":"2024-05-01T12:00:01Z","dimension":"gateway_merchant","value":"stripe_acme","success_rate":88.0}),
        json!({"type":"alert","id":"a-1","dimension":"gateway","value":"adyen","timestamp":"2024-05-01T12:00:02Z",
               "current_rate":80.0,"previous_rate":95.0,"drop_percentage":15.79,"confidence":0.9,
               "root_cause":"issuer timeout spike","recommendations":["shift traffic"]}),
    ];
    for frame in frames {
        monitor.ingest(&frame.to_string()).await.unwrap();
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Next SSE chunk as text; axum emits one chunk per event.
async fn next_frame<S, B, E>(body: &mut S) -> String
where
    S: futures::Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Debug,
{
    let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("no SSE frame")
        .expect("stream ended")
        .unwrap();
    String::from_utf8(chunk.as_ref().to_vec()).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Chart and alerts
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_chart_for_active_dimension() {
    let (app, monitor) = setup();
    seed(&monitor).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/chart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dimension"], "gateway");
    assert_eq!(body["title"], "Success Rate by Gateway");
    assert_eq!(body["has_data"], true);
    assert_eq!(body["series"], json!(["stripe", "adyen"]));
    assert_eq!(
        body["rows"],
        json!([
            {"timestamp": "12:00:00", "stripe": 99.1, "adyen": 95.0},
            {"timestamp": "12:00:01", "stripe": 97.3},
        ])
    );
}

#[tokio::test]
async fn test_chart_for_named_dimension() {
    let (app, monitor) = setup();
    seed(&monitor).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/chart/gateway_merchant", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["series"], json!(["stripe_acme"]));

    let (status, body) = send(&app, Method::GET, "/api/v1/chart/gateway_payment_method", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_data"], false);
    assert_eq!(body["rows"], json!([]));
}

#[tokio::test]
async fn test_chart_for_unknown_dimension_is_404() {
    let (app, _) = setup();
    let (status, body) = send(&app, Method::GET, "/api/v1/chart/region", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "unknown_dimension");
}

#[tokio::test]
async fn test_alerts_are_listed_with_presentation_fields() {
    let (app, monitor) = setup();
    seed(&monitor).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/alerts", None).await;
    assert_eq!(status, StatusCode::OK);
    let alerts = body.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["id"], "a-1");
    assert_eq!(alerts[0]["confidence_percent"], 90);
    assert_eq!(alerts[0]["dimension_label"], "Gateway");
    assert_eq!(alerts[0]["has_analysis"], true);
    assert_eq!(alerts[0]["recommendations"], json!(["shift traffic"]));
}

// ═══════════════════════════════════════════════════════════════════
// Dimension selection and reset
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_select_dimension_switches_chart() {
    let (app, monitor) = setup();
    seed(&monitor).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/dimension",
        Some(json!({"dimension": "gateway_merchant"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], "gateway_merchant");

    let (_, chart) = send(&app, Method::GET, "/api/v1/chart", None).await;
    assert_eq!(chart["dimension"], "gateway_merchant");
    assert_eq!(chart["title"], "Success Rate by Gateway Merchant");
}

#[tokio::test]
async fn test_select_unknown_dimension_is_rejected_and_ignored() {
    let (app, _) = setup();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/dimension",
        Some(json!({"dimension": "region"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "selection_rejected");

    let (_, dims) = send(&app, Method::GET, "/api/v1/dimensions", None).await;
    assert_eq!(dims["active"], "gateway");
    assert_eq!(
        dims["dimensions"],
        json!([
            {"id": "gateway", "label": "Gateway"},
            {"id": "gateway_payment_method", "label": "Gateway Payment Method"},
            {"id": "gateway_merchant", "label": "Gateway Merchant"},
        ])
    );
}

#[tokio::test]
async fn test_reset_clears_chart_and_alerts() {
    let (app, monitor) = setup();
    seed(&monitor).await;

    let (status, _) = send(&app, Method::POST, "/api/v1/reset", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, chart) = send(&app, Method::GET, "/api/v1/chart", None).await;
    assert_eq!(chart["has_data"], false);
    let (_, alerts) = send(&app, Method::GET, "/api/v1/alerts", None).await;
    assert_eq!(alerts, json!([]));
}

// ═══════════════════════════════════════════════════════════════════
// Operational endpoints
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_healthz_and_headers() {
    let (app, _) = setup();
    let resp = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["cache-control"], "no-store");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_window_gauge() {
    let (app, monitor) = setup();
    seed(&monitor).await;

    let resp = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("monitor_window_samples 4"));
    assert!(text.contains("monitor_alert_history 1"));
}

#[tokio::test]
async fn test_unknown_api_route_is_404() {
    let (app, _) = setup();
    let (status, _) = send(&app, Method::GET, "/api/v1/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stream_sends_initial_dashboard_snapshot() {
    let (app, monitor) = setup();
    seed(&monitor).await;

    let resp = app
        .oneshot(Request::builder().uri("/api/v1/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");

    let mut body = resp.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("no SSE frame")
        .unwrap()
        .unwrap();
    let frame = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(frame.starts_with("event: dashboard\n"));

    let data = frame
        .lines()
        .find_map(|l| l.strip_prefix("data: "))
        .unwrap();
    let snapshot: Value = serde_json::from_str(data).unwrap();
    assert_eq!(snapshot["chart"]["dimension"], "gateway");
    assert_eq!(snapshot["alerts"][0]["id"], "a-1");
    assert_eq!(snapshot["revision"], 5);
}

/// Unchanged state yields heartbeats only; a change yields one new snapshot,
/// no sooner than one render interval after the previous frame.
#[tokio::test]
async fn test_stream_pushes_only_on_revision_change() {
    let (app, monitor) = setup();
    seed(&monitor).await;

    let resp = app
        .oneshot(Request::builder().uri("/api/v1/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let mut body = resp.into_body().into_data_stream();

    let first = next_frame(&mut body).await;
    assert!(first.starts_with("event: dashboard\n"));

    // nothing changed: two ticks, two heartbeats
    for _ in 0..2 {
        let frame = next_frame(&mut body).await;
        assert!(frame.starts_with(':'), "expected heartbeat, got {:?}", frame);
        assert!(frame.contains("heartbeat"));
    }

    monitor
        .ingest(
            &json!({"type":"metrics","timestamp":"2024-05-01T12:00:03Z","dimension":"gateway",
                    "value":"stripe","success_rate":96.0})
            .to_string(),
        )
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let frame = next_frame(&mut body).await;
    assert!(started.elapsed() >= Duration::from_millis(20));
    assert!(frame.starts_with("event: dashboard\n"), "got {:?}", frame);
    let data = frame
        .lines()
        .find_map(|l| l.strip_prefix("data: "))
        .unwrap();
    let snapshot: Value = serde_json::from_str(data).unwrap();
    assert_eq!(snapshot["revision"], 6);
    assert_eq!(snapshot["chart"]["rows"].as_array().unwrap().len(), 3);

    let frame = next_frame(&mut body).await;
    assert!(frame.starts_with(':'), "expected heartbeat, got {:?}", frame);
}
