// src/core/attendance/types.rs
use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;
use chrono::{DateTime, Duration, SubsecRound, Utc};

use crate::core::identity::types::IdentityId;

pub const UNSPECIFIED_DEVICE: &str = "unspecified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    In,
    Out,
}

impl EventType {
    /// No history or a trailing OUT starts a new shift; a trailing IN closes it.
    pub fn next_after(previous: Option<EventType>) -> EventType {
        match previous {
            None | Some(EventType::Out) => EventType::In,
            Some(EventType::In) => EventType::Out,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::In => "IN",
            EventType::Out => "OUT",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEvent {
    pub id: Uuid,
    pub identity_id: IdentityId,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub source_device: String,
}

impl AttendanceEvent {
    pub fn new(
        identity_id: IdentityId,
        timestamp: DateTime<Utc>,
        event_type: EventType,
        source_device: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity_id,
            timestamp,
            event_type,
            source_device: source_device.into(),
        }
    }
}

/// Timestamp for the next event of an identity: wall clock truncated to whole
/// microseconds, but always at least one microsecond after the previous event.
pub fn next_timestamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(6);
    match previous {
        Some(previous) if now <= previous.trunc_subsecs(6) => {
            previous.trunc_subsecs(6) + Duration::microseconds(1)
        }
        _ => now,
    }
}

/// Newest first: timestamp desc, then identity id desc, then event id desc.
pub fn newest_first(a: &AttendanceEvent, b: &AttendanceEvent) -> Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| b.identity_id.cmp(&a.identity_id))
        .then_with(|| b.id.cmp(&a.id))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub identity_id: Option<IdentityId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl EventQuery {
    pub fn for_identity(identity_id: IdentityId) -> Self {
        Self { identity_id: Some(identity_id), ..Default::default() }
    }

    /// `since` and `until` are both inclusive.
    pub fn matches(&self, event: &AttendanceEvent) -> bool {
        self.identity_id.map_or(true, |id| event.identity_id == id)
            && self.since.map_or(true, |since| event.timestamp >= since)
            && self.until.map_or(true, |until| event.timestamp <= until)
    }
}
