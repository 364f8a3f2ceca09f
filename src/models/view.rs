//! Render-ready shapes handed to the presentation layer.

use serde::Serialize;

use super::chart::{Aggregation, TimeBucketRow};
use super::event::Alert;

/// Everything a chart widget needs for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub dimension: String,
    pub dimension_label: String,
    pub title: String,
    /// Legend entries, one line per series.
    pub series: Vec<String>,
    pub rows: Vec<TimeBucketRow>,
    /// `false` means render a "no data" placeholder instead of a chart.
    pub has_data: bool,
}

impl ChartView {
    pub fn new(dimension: &str, aggregation: Aggregation) -> Self {
        let dimension_label = humanize_dimension(dimension);
        Self {
            dimension: dimension.to_string(),
            title: format!("Success Rate by {}", dimension_label),
            dimension_label,
            has_data: !aggregation.is_empty(),
            series: aggregation.series,
            rows: aggregation.rows,
        }
    }
}

/// An alert plus the display fields derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertCard {
    #[serde(flatten)]
    pub alert: Alert,
    pub dimension_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_percent: Option<u32>,
    pub has_analysis: bool,
}

impl From<Alert> for AlertCard {
    fn from(alert: Alert) -> Self {
        let confidence_percent = alert
            .confidence
            .filter(|c| *c > 0.0)
            .map(|c| (c * 100.0).round() as u32);
        Self {
            dimension_label: humanize_dimension(&alert.dimension),
            has_analysis: alert.has_analysis(),
            confidence_percent,
            alert,
        }
    }
}

/// Everything the live dashboard shows, taken under one read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub revision: u64,
    pub chart: ChartView,
    pub alerts: Vec<AlertCard>,
}

/// A selectable dimension as shown in a selector control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionOption {
    pub id: String,
    pub label: String,
}

impl DimensionOption {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: humanize_dimension(id),
        }
    }
}

/// `gateway_payment_method` -> `Gateway Payment Method`.
pub fn humanize_dimension(dimension: &str) -> String {
    dimension
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
