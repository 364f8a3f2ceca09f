//! Event types carried on the live feed.
//!
//! Both kinds are immutable once classified: stores own them and hand out
//! copies, never references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One success-rate observation for a single series within a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Observation time, millisecond precision.
    pub timestamp: DateTime<Utc>,
    /// Grouping axis, e.g. `gateway` or `gateway_payment_method`.
    pub dimension: String,
    /// Series within the dimension, e.g. a gateway name.
    pub value: String,
    /// Percentage in `[0, 100]`.
    pub success_rate: f64,
}

/// A pre-computed anomaly notification with its diagnostic context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub dimension: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
    pub current_rate: f64,
    pub previous_rate: f64,
    pub drop_percentage: f64,
    /// `None` when the analyzer did not report a confidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub related_changes: Vec<String>,
}

impl Alert {
    /// True when any diagnostic detail beyond the rates is attached.
    pub fn has_analysis(&self) -> bool {
        self.root_cause.is_some()
            || !self.recommendations.is_empty()
            || !self.related_changes.is_empty()
    }
}

/// A classified inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Metric(MetricSample),
    Alert(Alert),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Metric(_) => EventKind::Metric,
            Event::Alert(_) => EventKind::Alert,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Metric,
    Alert,
}

impl EventKind {
    /// Wire discriminator, also used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Metric => "metrics",
            EventKind::Alert => "alert",
        }
    }
}
