// src/api/types.rs
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::core::{
    attendance::types::{AttendanceEvent, EventQuery, EventType},
    identity::types::{Identity, IdentityId},
    services::{attendance::CheckOutcome, report::Report},
};

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub name: String,
    pub template: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollResponse {
    pub id: IdentityId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for EnrollResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.display_name.clone(),
            created_at: identity.enrolled_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInOutRequest {
    pub template: Vec<f32>,
    #[serde(default)]
    pub source_device: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInOutResponse {
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub identity_id: IdentityId,
    pub name: String,
}

impl From<&CheckOutcome> for CheckInOutResponse {
    fn from(outcome: &CheckOutcome) -> Self {
        Self {
            event_type: outcome.event.event_type,
            timestamp: outcome.event.timestamp,
            identity_id: outcome.resolution.identity_id,
            name: outcome.resolution.display_name.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    pub identity_id: Option<IdentityId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl From<ReportParams> for EventQuery {
    fn from(params: ReportParams) -> Self {
        EventQuery {
            identity_id: params.identity_id,
            since: params.since,
            until: params.until,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub total_records: usize,
    pub records: Vec<AttendanceEvent>,
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        Self {
            total_records: report.total_records,
            records: report.records,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
