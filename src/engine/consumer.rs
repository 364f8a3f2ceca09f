//! Single consumer loop between the feed channel and the monitor.
//!
//! Events are applied one at a time in arrival order. Classification failures
//! are logged and counted, never retried. The loop ends when every sender is
//! dropped; it owns no timers or background work beyond that.

use tokio::sync::mpsc;

use super::SharedMonitor;
use crate::metrics::MonitorMetrics;

/// What the transport hands to the core.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// A new connection was established; prior state belongs to a dead session.
    SessionStarted,
    /// One raw text frame, not yet classified.
    Event(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumeStats {
    pub applied: u64,
    pub dropped: u64,
    pub sessions: u64,
}

/// Drain `rx` into `monitor` until the channel closes.
pub async fn consume(
    mut rx: mpsc::Receiver<FeedMessage>,
    monitor: SharedMonitor,
    metrics: MonitorMetrics,
) -> ConsumeStats {
    let mut stats = ConsumeStats::default();

    while let Some(message) = rx.recv().await {
        match message {
            FeedMessage::SessionStarted => {
                monitor.reset().await;
                stats.sessions += 1;
                metrics.record_session();
                tracing::info!(session = stats.sessions, "feed session started, window reset");
            }
            FeedMessage::Event(raw) => match monitor.ingest(&raw).await {
                Ok(kind) => {
                    stats.applied += 1;
                    metrics.record_event(kind.as_str());
                }
                Err(e) => {
                    stats.dropped += 1;
                    metrics.record_drop(e.reason());
                    tracing::warn!(error = %e, "dropping feed event");
                }
            },
        }

        let (window, alerts) = monitor.sizes().await;
        metrics.observe_sizes(window, alerts);
    }

    tracing::info!(
        applied = stats.applied,
        dropped = stats.dropped,
        sessions = stats.sessions,
        "feed channel closed, consumer stopped"
    );
    stats
}
