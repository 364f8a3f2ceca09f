//! Ingestion, windowing and aggregation core.
//!
//! [`Monitor`] owns the metric window, the alert history and the dimension
//! selection. It is plain synchronous state: one writer (the feed consumer)
//! mutates it per event, readers get owned copies. Aggregation only runs on
//! read, so ingestion stays O(1) amortized regardless of event rate.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::ClassifyError;
use crate::models::{
    Aggregation, Alert, AlertCard, ChartView, DashboardSnapshot, DimensionOption, Event, EventKind,
};

pub mod aggregator;
pub mod alerts;
pub mod classifier;
pub mod consumer;
pub mod selection;
pub mod window;

pub use aggregator::aggregate;
pub use alerts::AlertHistory;
pub use classifier::{classify, classify_value};
pub use consumer::{consume, ConsumeStats, FeedMessage};
pub use selection::DimensionSelection;
pub use window::MetricWindow;

/// Construction parameters for a [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub dimensions: Vec<String>,
    pub default_dimension: String,
    pub window_capacity: usize,
    pub alert_capacity: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            default_dimension: "gateway".to_string(),
            window_capacity: window::DEFAULT_WINDOW_CAPACITY,
            alert_capacity: alerts::DEFAULT_ALERT_CAPACITY,
        }
    }
}

pub fn default_dimensions() -> Vec<String> {
    ["gateway", "gateway_payment_method", "gateway_merchant"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

pub struct Monitor {
    window: MetricWindow,
    alerts: AlertHistory,
    selection: DimensionSelection,
    revision: u64,
}

impl Monitor {
    pub fn new(settings: &MonitorSettings) -> anyhow::Result<Self> {
        let selection = DimensionSelection::new(
            settings.dimensions.clone(),
            &settings.default_dimension,
        )
        .ok_or_else(|| anyhow::anyhow!("at least one dimension must be configured"))?;

        Ok(Self {
            window: MetricWindow::new(settings.window_capacity),
            alerts: AlertHistory::new(settings.alert_capacity),
            selection,
            revision: 0,
        })
    }

    /// Classify a raw frame and route it. A failed classification leaves
    /// every store untouched.
    pub fn ingest(&mut self, raw: &str) -> Result<EventKind, ClassifyError> {
        let event = classify(raw)?;
        Ok(self.apply(event))
    }

    pub fn apply(&mut self, event: Event) -> EventKind {
        let kind = event.kind();
        match event {
            Event::Metric(sample) => self.window.append(sample),
            Event::Alert(alert) => self.alerts.record(alert),
        }
        self.revision += 1;
        kind
    }

    /// Aggregate the window for the active dimension.
    pub fn aggregate_current(&self) -> Aggregation {
        aggregate(&self.window.snapshot(self.selection.current()))
    }

    pub fn chart(&self) -> ChartView {
        ChartView::new(self.selection.current(), self.aggregate_current())
    }

    /// Chart for an arbitrary dimension, independent of the selection.
    pub fn chart_for(&self, dimension: &str) -> ChartView {
        ChartView::new(dimension, aggregate(&self.window.snapshot(dimension)))
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.list()
    }

    pub fn alert_cards(&self) -> Vec<AlertCard> {
        self.alerts.list().into_iter().map(AlertCard::from).collect()
    }

    pub fn select(&mut self, dimension: &str) -> bool {
        let previous = self.selection.current().to_string();
        let accepted = self.selection.select(dimension);
        if accepted && previous != dimension {
            self.revision += 1;
        }
        accepted
    }

    pub fn current(&self) -> &str {
        self.selection.current()
    }

    pub fn dimensions(&self) -> &[String] {
        self.selection.dimensions()
    }

    pub fn is_configured(&self, dimension: &str) -> bool {
        self.selection.is_configured(dimension)
    }

    /// Clear both stores for a fresh feed session. The selection survives.
    pub fn reset(&mut self) {
        self.window.clear();
        self.alerts.clear();
        self.revision += 1;
    }

    /// Bumped on every state change; renderers compare it to skip redundant work.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn window(&self) -> &MetricWindow {
        &self.window
    }

    pub fn alert_history(&self) -> &AlertHistory {
        &self.alerts
    }
}

/// Dimension selector payload: the options and which one is active.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DimensionsView {
    pub dimensions: Vec<DimensionOption>,
    pub active: String,
}

/// Shared, cheaply-cloneable handle to a [`Monitor`].
///
/// The feed consumer is the only writer; the presentation side reads.
/// Every read returns owned data, so nothing observes a half-applied event.
#[derive(Clone)]
pub struct SharedMonitor(Arc<RwLock<Monitor>>);

impl SharedMonitor {
    pub fn new(monitor: Monitor) -> Self {
        Self(Arc::new(RwLock::new(monitor)))
    }

    pub async fn ingest(&self, raw: &str) -> Result<EventKind, ClassifyError> {
        self.0.write().await.ingest(raw)
    }

    pub async fn apply(&self, event: Event) -> EventKind {
        self.0.write().await.apply(event)
    }

    pub async fn chart(&self) -> ChartView {
        self.0.read().await.chart()
    }

    /// `None` when the dimension is not configured.
    pub async fn chart_for(&self, dimension: &str) -> Option<ChartView> {
        let monitor = self.0.read().await;
        if !monitor.is_configured(dimension) {
            return None;
        }
        Some(monitor.chart_for(dimension))
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.0.read().await.alerts()
    }

    pub async fn alert_cards(&self) -> Vec<AlertCard> {
        self.0.read().await.alert_cards()
    }

    /// Chart, alerts and revision from the same state.
    pub async fn dashboard(&self) -> DashboardSnapshot {
        let monitor = self.0.read().await;
        DashboardSnapshot {
            revision: monitor.revision(),
            chart: monitor.chart(),
            alerts: monitor.alert_cards(),
        }
    }

    pub async fn select(&self, dimension: &str) -> bool {
        self.0.write().await.select(dimension)
    }

    pub async fn current(&self) -> String {
        self.0.read().await.current().to_string()
    }

    pub async fn dimensions(&self) -> DimensionsView {
        let monitor = self.0.read().await;
        DimensionsView {
            dimensions: monitor
                .dimensions()
                .iter()
                .map(|d| DimensionOption::new(d))
                .collect(),
            active: monitor.current().to_string(),
        }
    }

    pub async fn reset(&self) {
        self.0.write().await.reset()
    }

    pub async fn revision(&self) -> u64 {
        self.0.read().await.revision()
    }

    /// `(window samples, alert history)` sizes.
    pub async fn sizes(&self) -> (usize, usize) {
        let monitor = self.0.read().await;
        (monitor.window().len(), monitor.alert_history().len())
    }
}
