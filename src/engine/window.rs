//! Bounded FIFO window of recent metric samples.
//!
//! One window is shared by every dimension; capacity counts samples across
//! all of them. Eviction follows arrival order, not sample timestamps.

use std::collections::VecDeque;

use crate::models::MetricSample;

pub const DEFAULT_WINDOW_CAPACITY: usize = 60;

/// Upfront allocation cap; larger windows grow on demand.
const PREALLOCATE_LIMIT: usize = 1024;

#[derive(Debug, Clone)]
pub struct MetricWindow {
    samples: VecDeque<MetricSample>,
    capacity: usize,
}

impl MetricWindow {
    /// A zero capacity is bumped to one so the newest sample is always visible.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            capacity,
        }
    }

    /// Append at the tail, evicting from the head once over capacity.
    pub fn append(&mut self, sample: MetricSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Copy of the held samples for one dimension, in arrival order.
    pub fn snapshot(&self, dimension: &str) -> Vec<MetricSample> {
        self.samples
            .iter()
            .filter(|s| s.dimension == dimension)
            .cloned()
            .collect()
    }

    /// Copy of every held sample, in arrival order.
    pub fn snapshot_all(&self) -> Vec<MetricSample> {
        self.samples.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for MetricWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(i: i64, dimension: &str) -> MetricSample {
        MetricSample {
            timestamp: Utc.timestamp_opt(1_714_564_800 + i, 0).unwrap(),
            dimension: dimension.to_string(),
            value: format!("gw{}", i % 3),
            success_rate: (i % 100) as f64,
        }
    }

    #[test]
    fn test_window_keeps_last_capacity_samples() {
        let mut window = MetricWindow::default();
        let all: Vec<_> = (0..75).map(|i| sample(i, "gateway")).collect();
        for s in &all {
            window.append(s.clone());
        }
        assert_eq!(window.len(), 60);
        assert_eq!(window.snapshot_all(), all[15..].to_vec());
    }

    #[test]
    fn test_capacity_is_global_across_dimensions() {
        let mut window = MetricWindow::new(4);
        window.append(sample(0, "gateway"));
        window.append(sample(1, "gateway_merchant"));
        window.append(sample(2, "gateway"));
        window.append(sample(3, "gateway_merchant"));
        window.append(sample(4, "gateway_merchant"));

        // sample 0 (gateway) was the oldest and got evicted
        assert_eq!(window.snapshot("gateway"), vec![sample(2, "gateway")]);
        assert_eq!(window.snapshot("gateway_merchant").len(), 3);
    }

    #[test]
    fn test_eviction_follows_arrival_not_timestamp() {
        let mut window = MetricWindow::new(2);
        window.append(sample(10, "gateway"));
        window.append(sample(1, "gateway")); // late arrival
        window.append(sample(5, "gateway"));
        assert_eq!(
            window.snapshot("gateway"),
            vec![sample(1, "gateway"), sample(5, "gateway")]
        );
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut window = MetricWindow::new(8);
        for i in 0..5 {
            window.append(sample(i, if i % 2 == 0 { "gateway" } else { "gateway_merchant" }));
        }
        assert_eq!(window.snapshot("gateway"), window.snapshot("gateway"));
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn test_snapshot_unknown_dimension_is_empty() {
        let mut window = MetricWindow::new(8);
        window.append(sample(0, "gateway"));
        assert!(window.snapshot("gateway_payment_method").is_empty());
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let mut window = MetricWindow::new(usize::MAX);
        window.append(sample(0, "gateway"));
        assert_eq!(window.len(), 1);
        assert_eq!(window.capacity(), usize::MAX);
    }

    #[test]
    fn test_clear() {
        let mut window = MetricWindow::new(3);
        window.append(sample(0, "gateway"));
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 3);
    }
}
