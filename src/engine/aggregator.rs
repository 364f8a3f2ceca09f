//! Time-bucket aggregation for charting.
//!
//! Samples are grouped into one-second buckets keyed by the truncated
//! instant, so ordering stays correct across hour and day boundaries even
//! though the display label only carries `HH:MM:SS`.

use chrono::SubsecRound;
use std::collections::{BTreeMap, HashSet};

use crate::models::{Aggregation, MetricSample, TimeBucketRow};

const BUCKET_LABEL_FORMAT: &str = "%H:%M:%S";

/// Fold samples into ascending bucket rows.
///
/// Within a bucket a repeated series value overwrites the earlier one
/// (arrival order). Empty input yields an empty aggregation.
pub fn aggregate(samples: &[MetricSample]) -> Aggregation {
    let mut buckets: BTreeMap<_, BTreeMap<String, f64>> = BTreeMap::new();
    let mut seen = HashSet::new();
    let mut series = Vec::new();

    for sample in samples {
        let bucket = sample.timestamp.trunc_subsecs(0);
        buckets
            .entry(bucket)
            .or_default()
            .insert(sample.value.clone(), sample.success_rate);

        if seen.insert(sample.value.as_str()) {
            series.push(sample.value.clone());
        }
    }

    let rows = buckets
        .into_iter()
        .map(|(bucket, values)| TimeBucketRow {
            label: bucket.format(BUCKET_LABEL_FORMAT).to_string(),
            bucket,
            values,
        })
        .collect();

    Aggregation { rows, series }
}
