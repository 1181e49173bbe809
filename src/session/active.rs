//! The active-profile pointer.

use parking_lot::RwLock;
use serde_json::Value;
use webnest_config::ProfileId;
use webnest_store::{KeyValueStore, StoreError, StorePath};

/// Store key of the persisted pointer.
pub const ACTIVE_PROFILE_KEY: &str = "activeProfile";

/// In-memory pointer mirrored to the store under [`ACTIVE_PROFILE_KEY`].
///
/// Readers never touch the store. Writers hold the write lock across the
/// store write, so a reader sees either the previous or the committed value,
/// never one whose persist later failed.
#[derive(Default)]
pub struct ActiveProfile {
    current: RwLock<Option<ProfileId>>,
}

impl ActiveProfile {
    pub fn new() -> Self {
        Self::default()
    }

    fn path() -> Result<StorePath, StoreError> {
        StorePath::from_segments([ACTIVE_PROFILE_KEY])
    }

    pub fn get(&self) -> Option<ProfileId> {
        self.current.read().clone()
    }

    /// Point at `id` (or at nothing) and persist it.
    ///
    /// `None` is persisted as an explicit `null`. On a store failure the
    /// in-memory value is rolled back and the error returned.
    pub fn set(&self, store: &dyn KeyValueStore, id: Option<ProfileId>) -> Result<(), StoreError> {
        let path = Self::path()?;
        let value = match &id {
            Some(id) => Value::String(id.to_string()),
            None => Value::Null,
        };

        let mut current = self.current.write();
        let previous = std::mem::replace(&mut *current, id);
        if let Err(e) = store.set(&path, value) {
            *current = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Point at nothing and remove the persisted key entirely.
    pub fn clear(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        let path = Self::path()?;

        let mut current = self.current.write();
        let previous = current.take();
        if let Err(e) = store.unset(&path) {
            *current = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Prime the in-memory pointer from the store.
    ///
    /// A persisted value that is not a string is treated as no pointer.
    pub fn load(&self, store: &dyn KeyValueStore) -> Result<Option<ProfileId>, StoreError> {
        let loaded = match store.get(&Self::path()?)? {
            Some(Value::String(id)) if !id.is_empty() => Some(ProfileId::new(id)),
            Some(Value::Null) | None => None,
            Some(other) => {
                log::warn!("Ignoring malformed {ACTIVE_PROFILE_KEY} value: {other}");
                None
            }
        };
        *self.current.write() = loaded.clone();
        Ok(loaded)
    }
}
