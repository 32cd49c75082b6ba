// src/storage/mod.rs
use std::sync::Arc;
use async_trait::async_trait;
use uuid::Uuid;

use crate::core::attendance::types::{AttendanceEvent, EventQuery};
use crate::core::identity::types::{Identity, IdentityId, Template};
use crate::utils::config::{StorageBackend, StorageConfig};

mod errors;
pub mod memory;
#[cfg(feature = "rocksdb-store")]
pub mod rocks;

pub use errors::{Result, StorageError};
pub use memory::{MemoryIdentityStore, MemoryLedger};

/// Enrolled identities. Read-mostly: writes only happen at enrollment.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Fails with `DuplicateKey` if the id is already present.
    async fn insert(&self, identity: Identity) -> Result<()>;

    async fn get(&self, id: &IdentityId) -> Result<Option<Identity>>;

    /// Lookup by normalized display name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Identity>>;

    /// All identities ordered by id.
    async fn all(&self) -> Result<Vec<Identity>>;

    /// Candidates worth scoring against `probe`. Stores without an index
    /// return everything.
    async fn candidates(&self, _probe: &Template) -> Result<Vec<Identity>> {
        self.all().await
    }

    async fn count(&self) -> Result<usize>;

    async fn ping(&self) -> Result<()>;
}

/// Append-only attendance events.
#[async_trait]
pub trait AttendanceLedger: Send + Sync {
    /// Most recent event for the identity, ties broken by event id descending.
    async fn latest(&self, identity_id: &IdentityId) -> Result<Option<AttendanceEvent>>;

    /// Appends `event` only if the identity's latest event id still equals
    /// `expected_previous`; otherwise fails with `Conflict`.
    async fn append(&self, event: AttendanceEvent, expected_previous: Option<Uuid>) -> Result<()>;

    /// Matching events, newest first.
    async fn query(&self, query: &EventQuery) -> Result<Vec<AttendanceEvent>>;

    async fn ping(&self) -> Result<()>;
}

pub type Stores = (Arc<dyn IdentityStore>, Arc<dyn AttendanceLedger>);

pub fn open(config: &StorageConfig) -> Result<Stores> {
    match config.backend {
        StorageBackend::Memory => {
            let store: Arc<dyn IdentityStore> = Arc::new(MemoryIdentityStore::new());
            let ledger: Arc<dyn AttendanceLedger> = Arc::new(MemoryLedger::new());
            Ok((store, ledger))
        }
        #[cfg(feature = "rocksdb-store")]
        StorageBackend::Rocksdb => {
            let db = Arc::new(rocks::RocksStore::open(&config.path)?);
            let store: Arc<dyn IdentityStore> = db.clone();
            let ledger: Arc<dyn AttendanceLedger> = db;
            Ok((store, ledger))
        }
        #[cfg(not(feature = "rocksdb-store"))]
        StorageBackend::Rocksdb => Err(StorageError::Unavailable(
            "rocksdb backend requires the rocksdb-store feature".into(),
        )),
    }
}
