use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::{
    core::{
        attendance::types::{AttendanceEvent, UNSPECIFIED_DEVICE},
        identity::types::Template,
        services::{
            resolution::{Resolution, ResolutionService},
            sequencer::AttendanceSequencer,
        },
    },
    utils::error::{AttendanceError, Result},
};

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub resolution: Resolution,
    pub event: AttendanceEvent,
}

/// A full scan: resolve the probe, then sequence the event. Matching is
/// finished before the sequencer takes the identity lock.
pub struct AttendanceService {
    resolution: Arc<ResolutionService>,
    sequencer: Arc<AttendanceSequencer>,
    timeout: Duration,
}

impl AttendanceService {
    pub fn new(
        resolution: Arc<ResolutionService>,
        sequencer: Arc<AttendanceSequencer>,
        timeout: Duration,
    ) -> Self {
        Self { resolution, sequencer, timeout }
    }

    /// Aborts with `Timeout` if the scan does not finish in time. An attempt
    /// cut off before the append leaves the ledger untouched; a committed
    /// append is never rolled back.
    pub async fn check_in_out(
        &self,
        template: Template,
        source_device: Option<&str>,
    ) -> Result<CheckOutcome> {
        let source_device = source_device
            .map(str::trim)
            .filter(|device| !device.is_empty())
            .unwrap_or(UNSPECIFIED_DEVICE);

        let scan = async {
            let resolution = self.resolution.resolve(template).await?;
            let event = self
                .sequencer
                .record_event(resolution.identity_id, source_device)
                .await?;
            Ok::<_, AttendanceError>(CheckOutcome { resolution, event })
        };

        match tokio::time::timeout(self.timeout, scan).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Scan timed out");
                Err(AttendanceError::Timeout)
            }
        }
    }
}
