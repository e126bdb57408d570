use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use dapp_bridge_core::{PortError, StoragePort};

/// In-memory key-value store. `deny()` makes every access report
/// [`PortError::StorageDenied`], the way a browser profile with storage
/// disabled behaves.
#[derive(Debug, Default)]
pub struct MemoryStorageAdapter {
    entries: Mutex<HashMap<String, String>>,
    denied: AtomicBool,
    write_attempts: AtomicU64,
}

impl MemoryStorageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denied() -> Self {
        let adapter = Self::default();
        adapter.deny();
        adapter
    }

    pub fn deny(&self) {
        self.denied.store(true, Ordering::SeqCst);
    }

    /// Number of `set` calls that reached this adapter, denied or not.
    pub fn write_attempts(&self) -> u64 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, PortError> {
        self.entries
            .lock()
            .map_err(|e| PortError::Transport(format!("storage lock poisoned: {e}")))
    }
}

impl StoragePort for MemoryStorageAdapter {
    fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(PortError::StorageDenied);
        }
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.denied.load(Ordering::SeqCst) {
            return Err(PortError::StorageDenied);
        }
        self.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Prefixes every key with a fixed scope so several bridges can share one
/// backing store without colliding.
#[derive(Debug)]
pub struct ScopedStorage<S> {
    inner: S,
    scope: String,
}

impl<S: StoragePort> ScopedStorage<S> {
    pub fn new(inner: S, scope: impl Into<String>) -> Self {
        Self {
            inner,
            scope: scope.into(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.scope, key)
    }
}

impl<S: StoragePort> StoragePort for ScopedStorage<S> {
    fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        self.inner.get(&self.scoped(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortError> {
        self.inner.set(&self.scoped(key), value)
    }
}
