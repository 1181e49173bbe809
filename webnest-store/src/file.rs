//! JSON-file-backed store.

use crate::atomic::write_atomic;
use crate::{KeyValueStore, Result, StoreError, StorePath, document};
use parking_lot::Mutex;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Durable store backed by a single JSON file.
///
/// The whole document is cached in memory. Mutations are applied to a copy,
/// written to disk atomically, and only then become visible, so a failed
/// write never leaves the cache ahead of the file.
pub struct FileStore {
    path: PathBuf,
    doc: Mutex<Value>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing or empty file opens as an empty document. A file that does
    /// not parse is an error; it is never silently replaced.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
            if contents.trim().is_empty() {
                log::info!("Store file {:?} is empty, starting fresh", path);
                document::empty()
            } else {
                serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            log::info!("No store file at {:?}, starting fresh", path);
            document::empty()
        };
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy of the document, persist it, then commit.
    fn commit<R>(&self, mutate: impl FnOnce(&mut Value) -> R) -> Result<R> {
        let mut doc = self.doc.lock();
        let mut next = doc.clone();
        let out = mutate(&mut next);
        let bytes = serde_json::to_vec_pretty(&next).map_err(StoreError::Serialize)?;
        write_atomic(&self.path, &bytes).map_err(|e| StoreError::io(&self.path, e))?;
        *doc = next;
        Ok(out)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, path: &StorePath) -> Result<Option<Value>> {
        Ok(document::get_at(&self.doc.lock(), path).cloned())
    }

    fn set(&self, path: &StorePath, value: Value) -> Result<()> {
        log::debug!("store set {}", path);
        self.commit(|doc| document::set_at(doc, path, value))
    }

    fn has(&self, path: &StorePath) -> Result<bool> {
        Ok(document::get_at(&self.doc.lock(), path).is_some())
    }

    fn unset(&self, path: &StorePath) -> Result<bool> {
        if !self.has(path)? {
            return Ok(false);
        }
        log::debug!("store unset {}", path);
        self.commit(|doc| document::remove_at(doc, path))
    }
}
