//! Profile-scoped session management.
//!
//! - [`registry`]: profile records in the store
//! - [`active`]: the active-profile pointer
//! - [`partition`]: per-profile storage partitions
//! - [`manager`]: [`SessionManager`], the single owner of all three

pub mod active;
pub mod error;
pub mod manager;
pub mod partition;
pub mod registry;

pub use active::{ACTIVE_PROFILE_KEY, ActiveProfile};
pub use error::SessionError;
pub use manager::{CreateProfileResult, SessionManager};
pub use partition::{
    DirectoryPartitions, PartitionBoundary, PartitionError, PartitionHandle, StorageKind,
    partition_name,
};
pub use registry::{PROFILES_KEY, ProfileMap, ProfileRegistry};
