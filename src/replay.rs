//! Offline replay of a recorded feed (one JSON envelope per line).
//!
//! Lines go through the same channel and consumer loop as the live feed,
//! then the resulting chart and alerts are rendered as plain text.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::engine::{consume, ConsumeStats, FeedMessage, SharedMonitor};
use crate::metrics::MonitorMetrics;
use crate::models::{AlertCard, ChartView};

/// Feed every non-blank line of `path` into `monitor`.
pub async fn replay_file(
    path: &Path,
    monitor: SharedMonitor,
    metrics: MonitorMetrics,
) -> anyhow::Result<ConsumeStats> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening replay file {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let (tx, rx) = mpsc::channel(256);
    let consumer = tokio::spawn(consume(rx, monitor, metrics));

    let mut line_no = 0usize;
    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("reading {}", path.display()))?
    {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        if tx.send(FeedMessage::Event(line)).await.is_err() {
            anyhow::bail!("consumer stopped early at line {}", line_no);
        }
    }
    drop(tx);

    let stats = consumer.await.context("consumer task panicked")?;
    tracing::info!(
        lines = line_no,
        applied = stats.applied,
        dropped = stats.dropped,
        "replay finished"
    );
    Ok(stats)
}

/// Plain-text table: one line per bucket, one column per series.
pub fn render_chart(view: &ChartView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.title);

    if !view.has_data {
        let _ = writeln!(out, "No data available for the selected dimension");
        return out;
    }

    let _ = write!(out, "{:<10}", "time");
    for series in &view.series {
        let _ = write!(out, " {:>14}", series);
    }
    let _ = writeln!(out);

    for row in &view.rows {
        let _ = write!(out, "{:<10}", row.label);
        for series in &view.series {
            match row.values.get(series) {
                Some(rate) => {
                    let _ = write!(out, " {:>13.2}%", rate);
                }
                None => {
                    let _ = write!(out, " {:>14}", "-");
                }
            }
        }
        let _ = writeln!(out);
    }
    out
}

pub fn render_alerts(alerts: &[AlertCard]) -> String {
    let mut out = String::new();
    if alerts.is_empty() {
        let _ = writeln!(out, "No alerts to display");
        return out;
    }

    let _ = writeln!(out, "Recent Alerts");
    for card in alerts {
        let a = &card.alert;
        let _ = writeln!(
            out,
            "- {} [{}] {}",
            card.dimension_label,
            a.value,
            a.timestamp.format("%b %-d, %Y %H:%M:%S")
        );
        let _ = writeln!(
            out,
            "    Success Rate: {:.2}% (Previous: {:.2}%)  Drop: {:.2}%",
            a.current_rate, a.previous_rate, a.drop_percentage
        );
        if let Some(pct) = card.confidence_percent {
            let _ = writeln!(out, "    Confidence: {}%", pct);
        }
        if let Some(cause) = &a.root_cause {
            let _ = writeln!(out, "    Root Cause: {}", cause);
        }
        for rec in &a.recommendations {
            let _ = writeln!(out, "    * {}", rec);
        }
        for change in &a.related_changes {
            let _ = writeln!(out, "    ~ {}", change);
        }
    }
    out
}
