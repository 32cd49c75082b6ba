// src/utils/metrics.rs
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{Duration, Instant};

pub struct Metrics {
    start_time: Instant,
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    processing_time: AtomicU64,
    scans_total: AtomicU64,
    scans_matched: AtomicU64,
    scans_unmatched: AtomicU64,
    scans_malformed: AtomicU64,
    events_recorded: AtomicU64,
    auth_rejected: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub requests_total: u64,
    pub requests_failed: u64,
    pub avg_processing_micros: u64,
    pub scans_total: u64,
    pub scans_matched: u64,
    pub scans_unmatched: u64,
    pub scans_malformed: u64,
    pub events_recorded: u64,
    pub auth_rejected: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            requests_total: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            processing_time: AtomicU64::new(0),
            scans_total: AtomicU64::new(0),
            scans_matched: AtomicU64::new(0),
            scans_unmatched: AtomicU64::new(0),
            scans_malformed: AtomicU64::new(0),
            events_recorded: AtomicU64::new(0),
            auth_rejected: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self, duration: Duration, success: bool) {
        self.requests_total.fetch_add(1, Ordering::SeqCst);
        self.processing_time.fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
        if !success {
            self.requests_failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn record_scan(&self, outcome: ScanOutcome) {
        self.scans_total.fetch_add(1, Ordering::SeqCst);
        let counter = match outcome {
            ScanOutcome::Matched => &self.scans_matched,
            ScanOutcome::Unmatched => &self.scans_unmatched,
            ScanOutcome::Malformed => &self.scans_malformed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_event(&self) {
        self.events_recorded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_auth_rejection(&self) {
        self.auth_rejected.fetch_add(1, Ordering::SeqCst);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests_total = self.requests_total.load(Ordering::SeqCst);
        let processing_time = self.processing_time.load(Ordering::SeqCst);

        MetricsSnapshot {
            uptime_secs: self.uptime().as_secs(),
            requests_total,
            requests_failed: self.requests_failed.load(Ordering::SeqCst),
            avg_processing_micros: processing_time.checked_div(requests_total).unwrap_or(0),
            scans_total: self.scans_total.load(Ordering::SeqCst),
            scans_matched: self.scans_matched.load(Ordering::SeqCst),
            scans_unmatched: self.scans_unmatched.load(Ordering::SeqCst),
            scans_malformed: self.scans_malformed.load(Ordering::SeqCst),
            events_recorded: self.events_recorded.load(Ordering::SeqCst),
            auth_rejected: self.auth_rejected.load(Ordering::SeqCst),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Matched,
    Unmatched,
    Malformed,
}
