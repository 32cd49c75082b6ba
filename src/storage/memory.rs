// src/storage/memory.rs
use std::collections::{BTreeMap, HashMap};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{AttendanceLedger, IdentityStore, Result, StorageError};
use crate::core::attendance::types::{newest_first, AttendanceEvent, EventQuery};
use crate::core::identity::types::{normalize_name, Identity, IdentityId};

#[derive(Default)]
struct IdentityTables {
    by_id: BTreeMap<IdentityId, Identity>,
    // first enrollment wins when duplicate names are allowed
    by_name: HashMap<String, IdentityId>,
}

/// In-process identity store for tests and single-node deployments.
#[derive(Default)]
pub struct MemoryIdentityStore {
    tables: RwLock<IdentityTables>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn insert(&self, identity: Identity) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.by_id.contains_key(&identity.id) {
            return Err(StorageError::DuplicateKey(identity.id.to_string()));
        }
        tables
            .by_name
            .entry(normalize_name(&identity.display_name))
            .or_insert(identity.id);
        tables.by_id.insert(identity.id, identity);
        Ok(())
    }

    async fn get(&self, id: &IdentityId) -> Result<Option<Identity>> {
        Ok(self.tables.read().by_id.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Identity>> {
        let tables = self.tables.read();
        Ok(tables
            .by_name
            .get(&normalize_name(name))
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    async fn all(&self) -> Result<Vec<Identity>> {
        Ok(self.tables.read().by_id.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.tables.read().by_id.len())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Events are kept per identity sorted by (timestamp, id), so the latest
/// event is the last element of its vector.
#[derive(Default)]
pub struct MemoryLedger {
    events: RwLock<HashMap<IdentityId, Vec<AttendanceEvent>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_key(event: &AttendanceEvent) -> (chrono::DateTime<chrono::Utc>, Uuid) {
    (event.timestamp, event.id)
}

#[async_trait]
impl AttendanceLedger for MemoryLedger {
    async fn latest(&self, identity_id: &IdentityId) -> Result<Option<AttendanceEvent>> {
        Ok(self
            .events
            .read()
            .get(identity_id)
            .and_then(|history| history.last())
            .cloned())
    }

    async fn append(&self, event: AttendanceEvent, expected_previous: Option<Uuid>) -> Result<()> {
        let mut events = self.events.write();
        let history = events.entry(event.identity_id).or_default();

        let current = history.last().map(|latest| latest.id);
        if current != expected_previous {
            return Err(StorageError::Conflict { identity_id: event.identity_id.to_string() });
        }

        let key = sort_key(&event);
        let position = history.partition_point(|existing| sort_key(existing) <= key);
        history.insert(position, event);
        Ok(())
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<AttendanceEvent>> {
        let events = self.events.read();
        let mut matching: Vec<AttendanceEvent> = match query.identity_id {
            Some(id) => events
                .get(&id)
                .map(|history| history.iter().filter(|e| query.matches(e)).cloned().collect())
                .unwrap_or_default(),
            None => events
                .values()
                .flatten()
                .filter(|e| query.matches(e))
                .cloned()
                .collect(),
        };
        matching.sort_by(newest_first);
        Ok(matching)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
