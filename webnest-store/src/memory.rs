//! In-memory store.

use crate::{KeyValueStore, Result, StorePath, document};
use parking_lot::Mutex;
use serde_json::Value;

/// Non-durable store with the same semantics as [`crate::FileStore`].
pub struct MemoryStore {
    doc: Mutex<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            doc: Mutex::new(document::empty()),
        }
    }

    /// Snapshot of the whole document.
    pub fn snapshot(&self) -> Value {
        self.doc.lock().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, path: &StorePath) -> Result<Option<Value>> {
        Ok(document::get_at(&self.doc.lock(), path).cloned())
    }

    fn set(&self, path: &StorePath, value: Value) -> Result<()> {
        document::set_at(&mut self.doc.lock(), path, value);
        Ok(())
    }

    fn has(&self, path: &StorePath) -> Result<bool> {
        Ok(document::get_at(&self.doc.lock(), path).is_some())
    }

    fn unset(&self, path: &StorePath) -> Result<bool> {
        Ok(document::remove_at(&mut self.doc.lock(), path))
    }
}
