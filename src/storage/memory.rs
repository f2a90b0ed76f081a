use super::{Namespace, StateStore};
use crate::model::StoreError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

type HashKey = (Namespace, String);

/// In-process store. Writes can be switched off to exercise failure paths.
#[derive(Default)]
pub struct MemoryStore {
    hashes: Mutex<HashMap<HashKey, HashMap<String, String>>>,
    reject_writes: AtomicBool,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `hset` fail with `WriteRejected`.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Makes every following call fail as if the connection dropped.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Seeds a hash directly, bypassing the write switch.
    pub fn seed(&self, namespace: Namespace, key: &str, fields: &[(&str, &str)]) {
        let mut hashes = self.hashes.lock().unwrap_or_else(|p| p.into_inner());
        let entry = hashes.entry((namespace, key.to_string())).or_default();
        for (field, value) in fields {
            entry.insert(field.to_string(), value.to_string());
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStore {
    async fn hgetall(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Result<HashMap<String, String>, StoreError> {
        self.check_available()?;
        let hashes = self
            .hashes
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(hashes
            .get(&(namespace, key.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn hset(
        &self,
        namespace: Namespace,
        key: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), StoreError> {
        self.check_available()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected(key.to_string()));
        }
        let mut hashes = self
            .hashes
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let entry = hashes.entry((namespace, key.to_string())).or_default();
        for (field, value) in fields {
            entry.insert(field.to_string(), value.to_string());
        }
        Ok(())
    }
}
