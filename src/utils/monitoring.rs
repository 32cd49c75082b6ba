// src/utils/monitoring.rs
use crate::utils::metrics::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct Monitor {
    metrics: Arc<Metrics>,
    log_interval: Duration,
}

impl Monitor {
    pub fn new(metrics: Arc<Metrics>, log_interval: Duration) -> Self {
        Self { metrics, log_interval }
    }

    /// Spawns the periodic metrics logger. Abort the handle to stop it.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.log_interval);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.log_metrics();
            }
        })
    }

    fn log_metrics(&self) {
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            uptime_secs = snapshot.uptime_secs,
            total_requests = snapshot.requests_total,
            failed_requests = snapshot.requests_failed,
            avg_process_time = snapshot.avg_processing_micros,
            scans = snapshot.scans_total,
            matched = snapshot.scans_matched,
            unmatched = snapshot.scans_unmatched,
            malformed = snapshot.scans_malformed,
            events = snapshot.events_recorded,
            auth_rejected = snapshot.auth_rejected,
            "System metrics"
        );
    }
}
