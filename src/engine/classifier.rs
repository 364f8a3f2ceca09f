//! Event classifier: raw feed envelope -> typed [`Event`].
//!
//! The `type` field is the discriminator. Everything else is validated
//! against the typed wire shape; any failure drops the event.

use chrono::{DateTime, SubsecRound, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ClassifyError;
use crate::models::{Alert, Event, MetricSample, BUCKET_LABEL_KEY};

#[derive(Debug, Deserialize)]
struct MetricWire {
    timestamp: DateTime<Utc>,
    dimension: String,
    value: String,
    success_rate: f64,
}

#[derive(Debug, Deserialize)]
struct AlertWire {
    id: String,
    dimension: String,
    value: String,
    timestamp: DateTime<Utc>,
    current_rate: f64,
    previous_rate: f64,
    drop_percentage: f64,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    root_cause: Option<String>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
    #[serde(default)]
    related_changes: Option<Vec<String>>,
}

/// Classify a raw text frame from the feed.
pub fn classify(raw: &str) -> Result<Event, ClassifyError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ClassifyError::MalformedEvent(format!("invalid JSON: {}", e)))?;
    classify_value(value)
}

/// Classify an already-parsed envelope.
pub fn classify_value(envelope: Value) -> Result<Event, ClassifyError> {
    let kind = match envelope.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(_) => {
            return Err(ClassifyError::MalformedEvent(
                "`type` must be a string".to_string(),
            ))
        }
        None => {
            return Err(ClassifyError::MalformedEvent(
                "missing `type` discriminator".to_string(),
            ))
        }
    };

    match kind.as_str() {
        "metrics" => {
            let wire: MetricWire = serde_json::from_value(envelope)
                .map_err(|e| ClassifyError::MalformedEvent(format!("metrics: {}", e)))?;
            metric_from_wire(wire).map(Event::Metric)
        }
        "alert" => {
            let wire: AlertWire = serde_json::from_value(envelope)
                .map_err(|e| ClassifyError::MalformedEvent(format!("alert: {}", e)))?;
            alert_from_wire(wire).map(Event::Alert)
        }
        other => Err(ClassifyError::UnknownEventKind(other.to_string())),
    }
}

fn metric_from_wire(wire: MetricWire) -> Result<MetricSample, ClassifyError> {
    require_non_empty("dimension", &wire.dimension)?;
    require_non_empty("value", &wire.value)?;
    if wire.value == BUCKET_LABEL_KEY {
        return Err(ClassifyError::MalformedEvent(format!(
            "series value `{}` is reserved for the bucket label",
            BUCKET_LABEL_KEY
        )));
    }

    if !wire.success_rate.is_finite() || !(0.0..=100.0).contains(&wire.success_rate) {
        return Err(ClassifyError::MalformedEvent(format!(
            "success_rate {} outside [0, 100]",
            wire.success_rate
        )));
    }

    Ok(MetricSample {
        timestamp: wire.timestamp.trunc_subsecs(3),
        dimension: wire.dimension,
        value: wire.value,
        success_rate: wire.success_rate,
    })
}

fn alert_from_wire(wire: AlertWire) -> Result<Alert, ClassifyError> {
    require_non_empty("id", &wire.id)?;
    require_non_empty("dimension", &wire.dimension)?;
    require_non_empty("value", &wire.value)?;

    // zero means the analyzer did not attach a confidence
    let confidence = match wire.confidence {
        Some(c) if !c.is_finite() || !(0.0..=1.0).contains(&c) => {
            return Err(ClassifyError::MalformedEvent(format!(
                "confidence {} outside [0, 1]",
                c
            )))
        }
        Some(c) if c > 0.0 => Some(c),
        _ => None,
    };

    Ok(Alert {
        id: wire.id,
        dimension: wire.dimension,
        value: wire.value,
        timestamp: wire.timestamp.trunc_subsecs(3),
        current_rate: wire.current_rate,
        previous_rate: wire.previous_rate,
        drop_percentage: wire.drop_percentage,
        confidence,
        root_cause: wire.root_cause.filter(|r| !r.trim().is_empty()),
        recommendations: wire.recommendations.unwrap_or_default(),
        related_changes: wire.related_changes.unwrap_or_default(),
    })
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ClassifyError> {
    if value.is_empty() {
        return Err(ClassifyError::MalformedEvent(format!("`{}` is empty", field)));
    }
    Ok(())
}
