//! Prometheus metrics for the ingestion pipeline.
//!
//! Exposes a standard `/metrics` endpoint that Prometheus can scrape.
//! Counters are updated by the consumer loop on every feed message.

use prometheus::{
    opts, Encoder, IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder,
};

/// Prometheus recorder with its own registry, so several monitors (and tests)
/// can coexist in one process.
#[derive(Clone)]
pub struct MonitorMetrics {
    registry: Registry,
    events_total: IntCounterVec,
    events_dropped_total: IntCounterVec,
    feed_sessions_total: IntCounter,
    window_samples: IntGauge,
    alert_history: IntGauge,
}

impl MonitorMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let events_total = IntCounterVec::new(
            opts!("monitor_events_total", "Events applied to the monitor, by kind"),
            &["kind"],
        )?;
        let events_dropped_total = IntCounterVec::new(
            opts!("monitor_events_dropped_total", "Events dropped at classification, by reason"),
            &["reason"],
        )?;
        let feed_sessions_total = IntCounter::with_opts(opts!(
            "monitor_feed_sessions_total",
            "Feed sessions started (each one resets the window)"
        ))?;
        let window_samples = IntGauge::with_opts(opts!(
            "monitor_window_samples",
            "Samples currently held in the metric window"
        ))?;
        let alert_history = IntGauge::with_opts(opts!(
            "monitor_alert_history",
            "Alerts currently held in the alert history"
        ))?;

        registry.register(Box::new(events_total.clone()))?;
        registry.register(Box::new(events_dropped_total.clone()))?;
        registry.register(Box::new(feed_sessions_total.clone()))?;
        registry.register(Box::new(window_samples.clone()))?;
        registry.register(Box::new(alert_history.clone()))?;

        Ok(Self {
            registry,
            events_total,
            events_dropped_total,
            feed_sessions_total,
            window_samples,
            alert_history,
        })
    }

    pub fn record_event(&self, kind: &str) {
        self.events_total.with_label_values(&[kind]).inc();
    }

    pub fn record_drop(&self, reason: &str) {
        self.events_dropped_total.with_label_values(&[reason]).inc();
    }

    pub fn record_session(&self) {
        self.feed_sessions_total.inc();
    }

    pub fn observe_sizes(&self, window: usize, alerts: usize) {
        self.window_samples.set(window as i64);
        self.alert_history.set(alerts as i64);
    }

    pub fn events(&self, kind: &str) -> u64 {
        self.events_total.with_label_values(&[kind]).get()
    }

    pub fn dropped(&self, reason: &str) -> u64 {
        self.events_dropped_total.with_label_values(&[reason]).get()
    }

    /// Encode all registered metrics as Prometheus text format.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
        String::from_utf8(buffer).unwrap_or_default()
    }
}
