// src/core/attendance/keyed_lock.rs
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per key, created on demand and dropped once nobody holds
/// or waits on it. Different keys never contend beyond the short map lookup.
pub struct KeyedMutex<K> {
    slots: Mutex<HashMap<K, Slot>>,
}

struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    // holders plus pending waiters
    users: usize,
}

/// Counts one user of a slot for as long as it lives, whether it ends up
/// holding the lock or is cancelled while waiting.
struct Registration<'a, K: Eq + Hash> {
    owner: &'a KeyedMutex<K>,
    key: K,
}

pub struct KeyedGuard<'a, K: Eq + Hash> {
    // field order matters: the mutex is released before the slot is counted down
    _guard: OwnedMutexGuard<()>,
    _registration: Registration<'a, K>,
}

impl<K: Eq + Hash + Clone> KeyedMutex<K> {
    pub fn new() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }

    pub async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        let mutex = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                mutex: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            slot.mutex.clone()
        };
        let registration = Registration { owner: self, key };
        let guard = mutex.lock_owned().await;

        KeyedGuard { _guard: guard, _registration: registration }
    }

    /// Number of keys currently held or waited on.
    pub fn active_keys(&self) -> usize {
        self.slots.lock().len()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedMutex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> Drop for Registration<'_, K> {
    fn drop(&mut self) {
        let mut slots = self.owner.slots.lock();
        let unused = match slots.get_mut(&self.key) {
            Some(slot) => {
                slot.users -= 1;
                slot.users == 0
            }
            None => false,
        };
        if unused {
            slots.remove(&self.key);
        }
    }
}
