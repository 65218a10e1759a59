//! Counters for checker statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::Status;

/// Counters for probe and notification statistics.
pub struct Counters {
    pub probes_total: AtomicU64,
    pub up_total: AtomicU64,
    pub down_total: AtomicU64,
    pub alarm_total: AtomicU64,
    pub notifications_sent: AtomicU64,
    pub delivery_failures: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self {
            probes_total: AtomicU64::new(0),
            up_total: AtomicU64::new(0),
            down_total: AtomicU64::new(0),
            alarm_total: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
        }
    }

    pub fn record_probe(&self, status: Status) {
        self.probes_total.fetch_add(1, Ordering::Relaxed);
        match status {
            Status::Up => self.up_total.fetch_add(1, Ordering::Relaxed),
            Status::Down => self.down_total.fetch_add(1, Ordering::Relaxed),
            Status::Alarm => self.alarm_total.fetch_add(1, Ordering::Relaxed),
            Status::Unknown => 0,
        };
    }

    pub fn record_notification(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn probes(&self) -> u64 {
        self.probes_total.load(Ordering::Relaxed)
    }

    pub fn notifications(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs checker statistics when there has been any activity.
pub fn log_stats(counters: &Counters, active_workers: usize) {
    let probes = counters.probes_total.load(Ordering::Relaxed);
    if probes == 0 {
        return;
    }

    tracing::info!(
        component = "checker",
        event = "stats",
        active_workers = active_workers,
        probes_total = probes,
        up_total = counters.up_total.load(Ordering::Relaxed),
        down_total = counters.down_total.load(Ordering::Relaxed),
        alarm_total = counters.alarm_total.load(Ordering::Relaxed),
        notifications_sent = counters.notifications_sent.load(Ordering::Relaxed),
        delivery_failures = counters.delivery_failures.load(Ordering::Relaxed),
        "checker statistics"
    );
}
