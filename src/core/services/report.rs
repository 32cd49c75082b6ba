use std::sync::Arc;

use crate::{
    core::attendance::types::{AttendanceEvent, EventQuery},
    storage::{AttendanceLedger, IdentityStore},
    utils::error::{AttendanceError, Result},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub total_records: usize,
    /// Newest first.
    pub records: Vec<AttendanceEvent>,
}

/// Read-only listing of the ledger. Takes no sequencing locks, so a report
/// may trail an in-flight scan by one event.
pub struct ReportService {
    store: Arc<dyn IdentityStore>,
    ledger: Arc<dyn AttendanceLedger>,
}

impl ReportService {
    pub fn new(store: Arc<dyn IdentityStore>, ledger: Arc<dyn AttendanceLedger>) -> Self {
        Self { store, ledger }
    }

    pub async fn report(&self, query: &EventQuery) -> Result<Report> {
        if let (Some(since), Some(until)) = (query.since, query.until) {
            if since > until {
                return Err(AttendanceError::MalformedInput("'since' must not be after 'until'".into()));
            }
        }

        if let Some(identity_id) = query.identity_id {
            if self.store.get(&identity_id).await?.is_none() {
                return Err(AttendanceError::IdentityNotFound(identity_id.to_string()));
            }
        }

        let records = self.ledger.query(query).await?;
        Ok(Report { total_records: records.len(), records })
    }
}
