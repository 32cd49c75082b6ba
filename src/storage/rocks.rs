// src/storage/rocks.rs
//! RocksDB-backed identity store and ledger.
//!
//! Key layout:
//! - `identity/{id}` → identity JSON
//! - `name/{normalized name}` → id of the first identity with that name
//! - `event/{identity id}/{timestamp nanos, zero padded}/{event id}` → event JSON
//!
//! Event keys sort by (identity, timestamp, event id), so the latest event of
//! an identity is a single reverse seek.
use std::path::Path;
use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use super::{AttendanceLedger, IdentityStore, Result, StorageError};
use crate::core::attendance::types::{newest_first, AttendanceEvent, EventQuery};
use crate::core::identity::types::{normalize_name, Identity, IdentityId};

const IDENTITY_PREFIX: &str = "identity/";
const NAME_PREFIX: &str = "name/";
const EVENT_PREFIX: &str = "event/";

pub struct RocksStore {
    db: DB,
    // serializes check-then-write sequences (duplicate ids, conditional append)
    write_lock: Mutex<()>,
}

impl RocksStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path)
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        Ok(Self { db, write_lock: Mutex::new(()) })
    }

    fn put_json<T: Serialize>(batch: &mut WriteBatch, key: &str, value: &T) -> Result<()> {
        let serialized = serde_json::to_vec(value)
            .map_err(|e| StorageError::InvalidFormat(e.to_string()))?;
        batch.put(key.as_bytes(), serialized);
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = match self.db.get(key.as_bytes())
            .map_err(|e| StorageError::DatabaseError(e.to_string()))? {
            Some(data) => data,
            None => return Ok(None),
        };

        let value = serde_json::from_slice(&raw)
            .map_err(|e| StorageError::InvalidFormat(e.to_string()))?;
        Ok(Some(value))
    }

    fn scan_prefix<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        let iter = self.db.iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));

        for item in iter {
            let (key, value) = item.map_err(|e| StorageError::DatabaseError(e.to_string()))?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            values.push(
                serde_json::from_slice(&value)
                    .map_err(|e| StorageError::InvalidFormat(e.to_string()))?,
            );
        }
        Ok(values)
    }

    fn latest_event(&self, identity_id: &IdentityId) -> Result<Option<AttendanceEvent>> {
        let prefix = event_prefix(identity_id);
        // '~' sorts after every digit and hyphen used in event keys
        let upper = format!("{}~", prefix);
        let mut iter = self.db.iterator(IteratorMode::From(upper.as_bytes(), Direction::Reverse));

        match iter.next() {
            Some(item) => {
                let (key, value) = item.map_err(|e| StorageError::DatabaseError(e.to_string()))?;
                if !key.starts_with(prefix.as_bytes()) {
                    return Ok(None);
                }
                let event = serde_json::from_slice(&value)
                    .map_err(|e| StorageError::InvalidFormat(e.to_string()))?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }
}

fn identity_key(id: &IdentityId) -> String {
    format!("{}{}", IDENTITY_PREFIX, id)
}

fn name_key(name: &str) -> String {
    format!("{}{}", NAME_PREFIX, normalize_name(name))
}

fn event_prefix(identity_id: &IdentityId) -> String {
    format!("{}{}/", EVENT_PREFIX, identity_id)
}

fn event_key(event: &AttendanceEvent) -> Result<String> {
    // nanosecond keys keep key order equal to (timestamp, event id) order
    let nanos = event.timestamp.timestamp_nanos_opt().ok_or_else(|| {
        StorageError::InvalidFormat(format!("timestamp {} out of range", event.timestamp))
    })?;
    Ok(format!(
        "{}{:020}/{}",
        event_prefix(&event.identity_id),
        nanos,
        event.id.hyphenated()
    ))
}

#[async_trait]
impl IdentityStore for RocksStore {
    async fn insert(&self, identity: Identity) -> Result<()> {
        let _write = self.write_lock.lock();
        let key = identity_key(&identity.id);
        if self.db.get(key.as_bytes())
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?
            .is_some()
        {
            return Err(StorageError::DuplicateKey(identity.id.to_string()));
        }

        let mut batch = WriteBatch::default();
        Self::put_json(&mut batch, &key, &identity)?;

        let name = name_key(&identity.display_name);
        if self.db.get(name.as_bytes())
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?
            .is_none()
        {
            batch.put(name.as_bytes(), identity.id.to_string().as_bytes());
        }

        self.db
            .write(batch)
            .map_err(|e| StorageError::DatabaseError(e.to_string()))
    }

    async fn get(&self, id: &IdentityId) -> Result<Option<Identity>> {
        self.get_json(&identity_key(id))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Identity>> {
        let raw = match self.db.get(name_key(name).as_bytes())
            .map_err(|e| StorageError::DatabaseError(e.to_string()))? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let id: IdentityId = String::from_utf8_lossy(&raw)
            .parse()
            .map_err(|e: uuid::Error| StorageError::InvalidFormat(e.to_string()))?;
        self.get_json(&identity_key(&id))
    }

    async fn all(&self) -> Result<Vec<Identity>> {
        self.scan_prefix(IDENTITY_PREFIX)
    }

    async fn count(&self) -> Result<usize> {
        let mut count = 0;
        let iter = self.db.iterator(IteratorMode::From(IDENTITY_PREFIX.as_bytes(), Direction::Forward));
        for item in iter {
            let (key, _) = item.map_err(|e| StorageError::DatabaseError(e.to_string()))?;
            if !key.starts_with(IDENTITY_PREFIX.as_bytes()) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    async fn ping(&self) -> Result<()> {
        self.db
            .property_value("rocksdb.estimate-num-keys")
            .map(|_| ())
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl AttendanceLedger for RocksStore {
    async fn latest(&self, identity_id: &IdentityId) -> Result<Option<AttendanceEvent>> {
        self.latest_event(identity_id)
    }

    async fn append(&self, event: AttendanceEvent, expected_previous: Option<Uuid>) -> Result<()> {
        let _write = self.write_lock.lock();

        let current = self.latest_event(&event.identity_id)?.map(|latest| latest.id);
        if current != expected_previous {
            return Err(StorageError::Conflict { identity_id: event.identity_id.to_string() });
        }

        let mut batch = WriteBatch::default();
        Self::put_json(&mut batch, &event_key(&event)?, &event)?;
        self.db
            .write(batch)
            .map_err(|e| StorageError::DatabaseError(e.to_string()))
    }

    async fn query(&self, query: &EventQuery) -> Result<Vec<AttendanceEvent>> {
        let prefix = match &query.identity_id {
            Some(id) => event_prefix(id),
            None => EVENT_PREFIX.to_string(),
        };

        let mut events: Vec<AttendanceEvent> = self
            .scan_prefix::<AttendanceEvent>(&prefix)?
            .into_iter()
            .filter(|event| query.matches(event))
            .collect();
        events.sort_by(newest_first);
        Ok(events)
    }

    async fn ping(&self) -> Result<()> {
        IdentityStore::ping(self).await
    }
}
