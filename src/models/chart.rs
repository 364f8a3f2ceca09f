use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// JSON key of the bucket label in a serialized row. Series values share the
/// same object, so no series may use this name.
pub const BUCKET_LABEL_KEY: &str = "timestamp";

/// One chart row: a one-second bucket and the rate observed per series in it.
///
/// Serializes flat, the shape line-chart widgets expect:
/// `{"timestamp": "12:00:01", "stripe": 99.1, "adyen": 95.0}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucketRow {
    /// Start of the bucket. Ordering key; the label alone is ambiguous across days.
    #[serde(skip_serializing)]
    pub bucket: DateTime<Utc>,
    #[serde(rename = "timestamp")]
    pub label: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    /// Ascending by bucket instant.
    pub rows: Vec<TimeBucketRow>,
    /// Distinct series across all rows, first-seen order.
    pub series: Vec<String>,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
