//! Profile records under the `profiles` store namespace.

use super::error::SessionError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use webnest_config::{Profile, ProfileId};
use webnest_store::{KeyValueStore, StoreError, StorePath};

/// Store key of the profiles mapping.
pub const PROFILES_KEY: &str = "profiles";

/// All profiles keyed by id.
pub type ProfileMap = BTreeMap<ProfileId, Profile>;

/// CRUD over profile records. Owns the "which profile exists" truth.
pub struct ProfileRegistry {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn namespace_path() -> Result<StorePath, StoreError> {
        StorePath::from_segments([PROFILES_KEY])
    }

    fn record_path(id: &ProfileId) -> Result<StorePath, StoreError> {
        StorePath::from_segments([PROFILES_KEY, id.as_str()])
    }

    /// All profiles, or `None` when the namespace was never initialized.
    ///
    /// An initialized namespace whose profiles were all deleted is `Some`
    /// of an empty map.
    pub fn get_all(&self) -> Result<Option<ProfileMap>, SessionError> {
        let Some(value) = self.store.get(&Self::namespace_path()?)? else {
            return Ok(None);
        };
        let Value::Object(entries) = value else {
            return Err(SessionError::MalformedNamespace);
        };

        let mut profiles = ProfileMap::new();
        for (id, record) in entries {
            let id = ProfileId::new(id);
            let profile = self.decode(&id, record)?;
            profiles.insert(id, profile);
        }
        Ok(Some(profiles))
    }

    pub fn get(&self, id: &ProfileId) -> Result<Option<Profile>, SessionError> {
        let Some(record) = self.store.get(&Self::record_path(id)?)? else {
            return Ok(None);
        };
        self.decode(id, record).map(Some)
    }

    /// Deserialize a stored record. A record written without a color gets
    /// one generated and written back, so later reads return the same color.
    fn decode(&self, id: &ProfileId, record: Value) -> Result<Profile, SessionError> {
        let missing_color = record.as_object().is_some_and(|r| !r.contains_key("color"));
        let profile: Profile =
            serde_json::from_value(record).map_err(|source| SessionError::MalformedRecord {
                id: id.to_string(),
                source,
            })?;
        if missing_color {
            let value = serde_json::to_value(&profile).map_err(StoreError::Serialize)?;
            self.store.set(&Self::record_path(id)?, value)?;
            log::info!("Assigned color {} to profile '{id}'", profile.color);
        }
        Ok(profile)
    }

    pub fn exists(&self, id: &ProfileId) -> Result<bool, SessionError> {
        Ok(self.store.has(&Self::record_path(id)?)?)
    }

    /// Initialize the namespace to an empty mapping if it is absent.
    ///
    /// Returns `true` when it was created by this call.
    pub fn ensure_namespace(&self) -> Result<bool, SessionError> {
        let path = Self::namespace_path()?;
        if self.store.has(&path)? {
            return Ok(false);
        }
        self.store.set(&path, Value::Object(Map::new()))?;
        crate::debug_info!("PROFILE", "Initialized empty profiles namespace");
        Ok(true)
    }

    /// Write `profile` at `profiles.<id>`, replacing any existing record.
    pub fn put(&self, profile: &Profile) -> Result<(), SessionError> {
        let value = serde_json::to_value(profile).map_err(StoreError::Serialize)?;
        self.store.set(&Self::record_path(&profile.id)?, value)?;
        Ok(())
    }

    /// Remove `profiles.<id>`. Returns the store's removal result.
    pub fn remove(&self, id: &ProfileId) -> Result<bool, SessionError> {
        Ok(self.store.unset(&Self::record_path(id)?)?)
    }
}
