//! The owning session controller.

use super::active::ActiveProfile;
use super::error::SessionError;
use super::partition::{PartitionBoundary, PartitionHandle, StorageKind, partition_name};
use super::registry::{ProfileMap, ProfileRegistry};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use webnest_config::{Profile, ProfileId};
use webnest_store::KeyValueStore;

/// Result of [`SessionManager::create_profile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateProfileResult {
    pub success: bool,
    pub id: ProfileId,
    pub name: String,
}

/// Profile registry, active pointer and partitions behind one writer lock.
///
/// Constructed once per process and shared by every handler. Every store
/// read and every mutation is serialized through `writer`, so two racing
/// switches can never lose an update. [`Self::get_active_profile`] is the one
/// exception: it reads the in-memory pointer without waiting.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    registry: ProfileRegistry,
    active: ActiveProfile,
    partitions: Arc<dyn PartitionBoundary>,
    clear_timeout: Duration,
    writer: Mutex<()>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        partitions: Arc<dyn PartitionBoundary>,
        clear_timeout: Duration,
    ) -> Self {
        Self {
            registry: ProfileRegistry::new(Arc::clone(&store)),
            store,
            active: ActiveProfile::new(),
            partitions,
            clear_timeout,
            writer: Mutex::new(()),
        }
    }

    /// Prime the in-memory pointer from the store. Call once at startup.
    ///
    /// A persisted pointer naming a profile that no longer exists is removed.
    pub async fn load_active_profile(&self) -> Result<Option<ProfileId>, SessionError> {
        let _guard = self.writer.lock().await;
        let Some(id) = self.active.load(self.store.as_ref())? else {
            return Ok(None);
        };

        if !self.registry.exists(&id)? {
            log::warn!("Persisted active profile '{id}' no longer exists; clearing it");
            self.active.clear(self.store.as_ref())?;
            return Ok(None);
        }

        crate::debug_info!("SESSION", "Restored active profile {}", id);
        Ok(Some(id))
    }

    /// All profiles; `None` if no profile was ever created.
    pub async fn get_all_profiles(&self) -> Result<Option<ProfileMap>, SessionError> {
        let _guard = self.writer.lock().await;
        self.registry.get_all()
    }

    pub async fn get_profile(&self, id: &ProfileId) -> Result<Option<Profile>, SessionError> {
        let _guard = self.writer.lock().await;
        self.registry.get(id)
    }

    /// Create (or overwrite) a profile with a fresh random color and make it
    /// the active profile.
    pub async fn create_profile(
        &self,
        id: ProfileId,
        name: String,
    ) -> Result<CreateProfileResult, SessionError> {
        let _guard = self.writer.lock().await;

        self.registry.ensure_namespace()?;
        let profile = Profile::new(id.clone(), name.clone());
        self.registry.put(&profile)?;
        self.active.set(self.store.as_ref(), Some(id.clone()))?;

        log::info!("Created profile '{}' ({})", id, profile.color);
        Ok(CreateProfileResult {
            success: true,
            id,
            name,
        })
    }

    /// Remove a profile record. The active pointer is left as-is even when
    /// it names the deleted profile.
    pub async fn delete_profile(&self, id: &ProfileId) -> Result<bool, SessionError> {
        let _guard = self.writer.lock().await;
        let removed = self.registry.remove(id)?;
        log::info!("Deleted profile '{id}' (removed: {removed})");
        Ok(removed)
    }

    /// In-memory active pointer. Never touches the store.
    pub fn get_active_profile(&self) -> Option<ProfileId> {
        self.active.get()
    }

    /// Switch the active profile. Persisted `null` for `None`.
    pub async fn set_active_profile(&self, id: Option<ProfileId>) -> Result<(), SessionError> {
        let _guard = self.writer.lock().await;
        self.active.set(self.store.as_ref(), id.clone())?;
        crate::debug_info!("SESSION", "Active profile set to {:?}", id);
        Ok(())
    }

    /// Clear the pointer and remove the persisted key.
    pub async fn clear_active_profile(&self) -> Result<(), SessionError> {
        let _guard = self.writer.lock().await;
        self.active.clear(self.store.as_ref())?;
        crate::debug_info!("SESSION", "Active profile cleared");
        Ok(())
    }

    /// Log out: wipe the active profile's partition, then clear the pointer.
    ///
    /// The pointer is set to `null` whether or not a profile was active. If
    /// the wipe fails or times out the error is returned and the pointer is
    /// not touched.
    pub async fn clear_active_profile_storage(&self) -> Result<(), SessionError> {
        let _guard = self.writer.lock().await;

        if let Some(id) = self.active.get() {
            self.clear_partition(&id).await?;
        }

        self.active.set(self.store.as_ref(), None)?;
        log::info!("Active profile storage cleared");
        Ok(())
    }

    /// Handle for a profile's partition.
    pub fn partition_for(&self, id: &ProfileId) -> Result<Arc<dyn PartitionHandle>, SessionError> {
        Ok(self.partitions.from_partition(&partition_name(id))?)
    }

    async fn clear_partition(&self, id: &ProfileId) -> Result<(), SessionError> {
        let partition = partition_name(id);
        let partitions = Arc::clone(&self.partitions);
        let name = partition.clone();

        let worker = tokio::task::spawn_blocking(move || {
            partitions
                .from_partition(&name)?
                .clear_storage_data(&StorageKind::ALL)
        });

        match tokio::time::timeout(self.clear_timeout, worker).await {
            Ok(Ok(Ok(()))) => {
                crate::debug_info!("SESSION", "Cleared storage of {}", partition);
                Ok(())
            }
            Ok(Ok(Err(source))) => Err(SessionError::PartitionClear { partition, source }),
            Ok(Err(join_error)) => Err(SessionError::ClearAborted {
                partition,
                message: join_error.to_string(),
            }),
            Err(_elapsed) => Err(SessionError::ClearTimeout {
                partition,
                timeout: self.clear_timeout,
            }),
        }
    }
}
