//! Most-recent-first alert history with a fixed cap.
//!
//! Alerts are not deduplicated by id: a redelivered alert is stored again.

use std::collections::VecDeque;

use crate::models::Alert;

pub const DEFAULT_ALERT_CAPACITY: usize = 10;

const PREALLOCATE_LIMIT: usize = 256;

#[derive(Debug, Clone)]
pub struct AlertHistory {
    alerts: VecDeque<Alert>,
    capacity: usize,
}

impl AlertHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            alerts: VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            capacity,
        }
    }

    /// Prepend, dropping the oldest entries beyond capacity.
    pub fn record(&mut self, alert: Alert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(self.capacity);
    }

    /// Copy of the history, newest first.
    pub fn list(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}

impl Default for AlertHistory {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_CAPACITY)
    }
}
