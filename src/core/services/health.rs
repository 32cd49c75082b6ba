// src/core/services/health.rs
use std::sync::Arc;
use serde::Serialize;
use tracing::warn;

use crate::{
    storage::{AttendanceLedger, IdentityStore},
    utils::metrics::{Metrics, MetricsSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub identity_store: Liveness,
    pub ledger: Liveness,
    pub enrolled_identities: Option<usize>,
    pub metrics: MetricsSnapshot,
}

pub struct HealthService {
    store: Arc<dyn IdentityStore>,
    ledger: Arc<dyn AttendanceLedger>,
    metrics: Arc<Metrics>,
}

impl HealthService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        ledger: Arc<dyn AttendanceLedger>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { store, ledger, metrics }
    }

    pub async fn check(&self) -> HealthReport {
        let (store_ping, ledger_ping, enrolled) =
            futures::join!(self.store.ping(), self.ledger.ping(), self.store.count());

        let identity_store = match store_ping {
            Ok(()) => Liveness::Up,
            Err(e) => {
                warn!("Identity store health check failed: {}", e);
                Liveness::Down
            }
        };
        let ledger = match ledger_ping {
            Ok(()) => Liveness::Up,
            Err(e) => {
                warn!("Ledger health check failed: {}", e);
                Liveness::Down
            }
        };

        let status = if identity_store == Liveness::Up && ledger == Liveness::Up {
            "ok"
        } else {
            "degraded"
        };

        HealthReport {
            status,
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            identity_store,
            ledger,
            enrolled_identities: enrolled.ok(),
            metrics: self.metrics.snapshot(),
        }
    }
}
