//! Storage partitions: one isolated browser-storage namespace per profile.
//!
//! A partition is named `persist:<profile id>`. The embedded browser surface
//! is modelled by [`PartitionBoundary`]; [`DirectoryPartitions`] is the
//! filesystem-backed implementation used by the shell itself.

use parking_lot::{Mutex, RwLock};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use webnest_config::ProfileId;

/// Prefix for persistent partition names.
pub const PARTITION_PREFIX: &str = "persist:";

/// Partition name for a profile. Same id, same name; distinct ids, distinct names.
pub fn partition_name(id: &ProfileId) -> String {
    format!("{PARTITION_PREFIX}{}", id.as_str())
}

/// Kinds of browser storage a partition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Indexed record storage
    IndexedDb,
    /// Key-value web storage
    LocalStorage,
    /// Shader / GPU cache
    ShaderCache,
    /// HTTP cache-like storage
    CacheStorage,
}

impl StorageKind {
    /// Every kind; the set wiped on logout.
    pub const ALL: [StorageKind; 4] = [
        StorageKind::IndexedDb,
        StorageKind::LocalStorage,
        StorageKind::ShaderCache,
        StorageKind::CacheStorage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::IndexedDb => "indexdb",
            StorageKind::LocalStorage => "localstorage",
            StorageKind::ShaderCache => "shadercache",
            StorageKind::CacheStorage => "cachestorage",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the partition boundary.
#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("invalid partition name '{0}'")]
    InvalidName(String),

    #[error("partition I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PartitionError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PartitionError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A handle to one partition.
pub trait PartitionHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Destructively clear the given storage kinds. No backup is taken.
    ///
    /// Either every requested kind is cleared or an error is returned.
    fn clear_storage_data(&self, kinds: &[StorageKind]) -> Result<(), PartitionError>;

    /// Write `value` under `key` in the given storage kind.
    fn write_entry(&self, kind: StorageKind, key: &str, value: &[u8])
    -> Result<(), PartitionError>;

    /// Read `key` from the given storage kind.
    fn read_entry(&self, kind: StorageKind, key: &str) -> Result<Option<Vec<u8>>, PartitionError>;
}

/// Storage-partition boundary of the embedded browser surface.
pub trait PartitionBoundary: Send + Sync {
    /// Obtain the handle for `name`, creating the partition on first use.
    fn from_partition(&self, name: &str) -> Result<Arc<dyn PartitionHandle>, PartitionError>;
}

/// Filesystem-backed partitions.
///
/// Layout: `<root>/<id component>/<storage kind>/<key component>`, each
/// component produced by [`path_component`].
pub struct DirectoryPartitions {
    root: PathBuf,
    handles: Mutex<HashMap<String, Arc<DirectoryPartition>>>,
}

impl DirectoryPartitions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory backing a partition name.
    pub fn partition_dir(&self, name: &str) -> Result<PathBuf, PartitionError> {
        let id = name
            .strip_prefix(PARTITION_PREFIX)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PartitionError::InvalidName(name.to_string()))?;
        Ok(self.root.join(path_component(id)))
    }
}

impl PartitionBoundary for DirectoryPartitions {
    fn from_partition(&self, name: &str) -> Result<Arc<dyn PartitionHandle>, PartitionError> {
        let mut handles = self.handles.lock();
        if let Some(handle) = handles.get(name) {
            return Ok(Arc::clone(handle) as Arc<dyn PartitionHandle>);
        }

        let dir = self.partition_dir(name)?;
        std::fs::create_dir_all(&dir).map_err(|e| PartitionError::io(&dir, e))?;
        crate::debug_log!("PARTITION", "Opened partition {} at {:?}", name, dir);

        let handle = Arc::new(DirectoryPartition {
            name: name.to_string(),
            dir,
            lock: RwLock::new(()),
        });
        handles.insert(name.to_string(), Arc::clone(&handle));
        Ok(handle)
    }
}

/// One partition directory.
///
/// Clears take the lock exclusively so they never interleave with reads or
/// writes of the same partition.
pub struct DirectoryPartition {
    name: String,
    dir: PathBuf,
    lock: RwLock<()>,
}

impl DirectoryPartition {
    fn entry_path(&self, kind: StorageKind, key: &str) -> PathBuf {
        self.dir.join(kind.as_str()).join(path_component(key))
    }
}

impl PartitionHandle for DirectoryPartition {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear_storage_data(&self, kinds: &[StorageKind]) -> Result<(), PartitionError> {
        let _guard = self.lock.write();
        for kind in kinds {
            let path = self.dir.join(kind.as_str());
            match std::fs::remove_dir_all(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(PartitionError::io(path, e)),
            }
        }
        crate::debug_info!("PARTITION", "Cleared {:?} in {}", kinds, self.name);
        Ok(())
    }

    fn write_entry(
        &self,
        kind: StorageKind,
        key: &str,
        value: &[u8],
    ) -> Result<(), PartitionError> {
        let _guard = self.lock.read();
        let path = self.entry_path(kind, key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PartitionError::io(parent, e))?;
        }
        std::fs::write(&path, value).map_err(|e| PartitionError::io(path, e))
    }

    fn read_entry(&self, kind: StorageKind, key: &str) -> Result<Option<Vec<u8>>, PartitionError> {
        let _guard = self.lock.read();
        let path = self.entry_path(kind, key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PartitionError::io(path, e)),
        }
    }
}

/// Longest escaped component used verbatim as a file name.
pub const MAX_ESCAPED_LEN: usize = 200;

/// Map an arbitrary string to a single file name, one-to-one.
///
/// Short values use [`escape_component`]. Values whose escaped form is
/// longer than [`MAX_ESCAPED_LEN`] become `%H` followed by the hex SHA-256 of
/// the raw value. Escaped output never contains `%H`, so the two forms
/// cannot collide.
pub fn path_component(raw: &str) -> String {
    let escaped = escape_component(raw);
    if escaped.len() <= MAX_ESCAPED_LEN {
        return escaped;
    }
    let digest = Sha256::digest(raw.as_bytes());
    let mut out = String::with_capacity(2 + digest.len() * 2);
    out.push_str("%H");
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Escape an arbitrary string into a single safe path component.
///
/// Lowercase ASCII letters, digits, `-` and `_` pass through; every other
/// byte becomes `%XX` with uppercase hex. The mapping is injective even on
/// case-insensitive filesystems.
pub fn escape_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Inverse of [`escape_component`]. Digest names from [`path_component`]
/// do not unescape.
pub fn unescape_component(escaped: &str) -> Option<String> {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = escaped.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
