//! Durable key-value store for webnest.
//!
//! Values live in a single nested JSON document addressed by dotted paths
//! (`profiles.<id>`, `activeProfile`). Two implementations share one trait:
//!
//! - [`FileStore`]: JSON file on disk, cached in memory, atomically rewritten on
//!   every mutation
//! - [`MemoryStore`]: same semantics without durability (tests, ephemeral runs)
//!
//! # Module layout
//!
//! - [`path`]: [`StorePath`] parsing and segment handling
//! - [`document`]: path-addressed reads and writes over a `serde_json::Value`
//! - [`atomic`]: temp-file + rename writes with owner-only permissions
//! - [`file`] / [`memory`]: the two store implementations

pub mod atomic;
pub mod document;
pub mod error;
pub mod file;
pub mod memory;
pub mod path;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use path::StorePath;

use serde_json::Value;

/// Result alias used throughout the store crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Process-wide persistent key-value storage.
///
/// Reads after a write in the same process always observe that write.
/// Failed writes leave the store at its previous value. Nothing is retried.
pub trait KeyValueStore: Send + Sync {
    /// Read the value at `path`, or `None` when nothing is stored there.
    fn get(&self, path: &StorePath) -> Result<Option<Value>>;

    /// Write `value` at `path`, creating intermediate mappings as needed.
    fn set(&self, path: &StorePath, value: Value) -> Result<()>;

    /// Whether a value (including an explicit `null`) exists at `path`.
    fn has(&self, path: &StorePath) -> Result<bool>;

    /// Remove the value at `path`. Returns `true` when something was removed.
    fn unset(&self, path: &StorePath) -> Result<bool>;
}
