//! In-memory object store.
//!
//! Same listing contract as the Redis adapter, no persistence. Used by the
//! `memory` backend, the demo binary and tests.

use crate::domain_model::ListMarker;
use crate::domain_port::*;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    max_keys_cap: u32,
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    put: AtomicBool,
    list: AtomicBool,
    get_keys: Mutex<HashSet<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_max_keys_cap(MAX_LIST_KEYS)
    }

    pub fn with_max_keys_cap(max_keys_cap: u32) -> Self {
        MemoryObjectStore {
            objects: RwLock::new(BTreeMap::new()),
            max_keys_cap: max_keys_cap.max(1),
            faults: Faults::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.objects.read().expect("object map poisoned").len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes every following `put` fail until switched off.
    pub fn fail_puts(&self, fail: bool) {
        self.faults.put.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.faults.list.store(fail, Ordering::SeqCst);
    }

    /// Makes `get` fail for this one key.
    pub fn fail_get_for(&self, key: &str) {
        self.fault_keys().insert(key.to_string());
    }

    fn get_should_fail(&self, key: &str) -> bool {
        self.fault_keys().contains(key)
    }

    // a plain set of keys stays valid even if a holder panicked
    fn fault_keys(&self) -> MutexGuard<'_, HashSet<String>> {
        self.faults
            .get_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), ObjectStoreError> {
        let write_err = |reason: &str| ObjectStoreError::Write {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        if self.faults.put.load(Ordering::SeqCst) {
            return Err(write_err("injected fault"));
        }
        let mut objects = self.objects.write().map_err(|_| write_err("lock poisoned"))?;
        objects.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        if self.get_should_fail(key) {
            return Err(ObjectStoreError::Read(format!("injected fault for {}", key)));
        }
        let objects = self
            .objects
            .read()
            .map_err(|_| ObjectStoreError::Read("lock poisoned".to_string()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))
    }

    async fn list_keys(
        &self,
        max_keys: u32,
        start_after: Option<&ListMarker>,
    ) -> Result<KeyPage, ObjectStoreError> {
        if self.faults.list.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Read("injected list fault".to_string()));
        }
        let limit = max_keys.clamp(1, self.max_keys_cap) as usize;
        let objects = self
            .objects
            .read()
            .map_err(|_| ObjectStoreError::Read("lock poisoned".to_string()))?;

        let lower = match start_after {
            Some(marker) => Bound::Excluded(marker.0.clone()),
            None => Bound::Unbounded,
        };
        // one extra key tells us whether another page exists
        let mut keys: Vec<String> = objects
            .range::<String, _>((lower, Bound::Unbounded))
            .take(limit + 1)
            .map(|(key, _)| key.clone())
            .collect();

        let next_marker = if keys.len() > limit {
            keys.truncate(limit);
            keys.last().cloned().map(ListMarker)
        } else {
            None
        };

        Ok(KeyPage { keys, next_marker })
    }
}
