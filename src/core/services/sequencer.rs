use std::sync::Arc;
use chrono::Utc;
use tracing::{error, info};

use crate::{
    core::{
        attendance::{
            keyed_lock::KeyedMutex,
            types::{next_timestamp, AttendanceEvent, EventType},
        },
        identity::types::IdentityId,
    },
    storage::AttendanceLedger,
    utils::{error::Result, metrics::Metrics},
};

/// Appends IN/OUT events so that every identity's history alternates.
///
/// The read-decide-append sequence for one identity runs under that
/// identity's lock; other identities proceed in parallel. The ledger append
/// is additionally conditional on the previous event id, which catches
/// writers outside this process. Failures are returned as-is and never
/// retried, since a retry could record two events for one scan.
pub struct AttendanceSequencer {
    ledger: Arc<dyn AttendanceLedger>,
    locks: KeyedMutex<IdentityId>,
    metrics: Arc<Metrics>,
}

impl AttendanceSequencer {
    pub fn new(ledger: Arc<dyn AttendanceLedger>, metrics: Arc<Metrics>) -> Self {
        Self {
            ledger,
            locks: KeyedMutex::new(),
            metrics,
        }
    }

    pub async fn record_event(
        &self,
        identity_id: IdentityId,
        source_device: &str,
    ) -> Result<AttendanceEvent> {
        let _guard = self.locks.lock(identity_id).await;

        let previous = self.ledger.latest(&identity_id).await.map_err(|e| {
            error!(identity = %identity_id, "Failed to read latest event: {}", e);
            e
        })?;

        let event_type = EventType::next_after(previous.as_ref().map(|e| e.event_type));
        let timestamp = next_timestamp(previous.as_ref().map(|e| e.timestamp), Utc::now());
        let event = AttendanceEvent::new(identity_id, timestamp, event_type, source_device);

        self.ledger
            .append(event.clone(), previous.map(|e| e.id))
            .await
            .map_err(|e| {
                error!(identity = %identity_id, "Failed to append attendance event: {}", e);
                e
            })?;

        self.metrics.record_event();
        info!(
            identity = %identity_id,
            event = %event.event_type,
            device = %event.source_device,
            "Attendance event recorded"
        );
        Ok(event)
    }
}
