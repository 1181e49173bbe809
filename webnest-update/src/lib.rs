//! Silent self-update for the webnest desktop shell.
//!
//! Provides:
//! - `lifecycle`: the single-instance update state machine
//!   (idle → checking → update-available → downloaded → restarting)
//! - `update_checker`: check-frequency gating and version comparison
//! - `feed`: a release-manifest backed [`lifecycle::UpdateDelivery`]
//! - `install`: installation type detection and in-place binary replacement
//! - `http`: HTTPS agent, URL validation, size-limited downloads

pub mod feed;
pub mod http;
pub mod install;
pub mod lifecycle;
pub mod update_checker;

pub use feed::ReleaseFeed;
pub use lifecycle::{
    LATER_BUTTON, MessageBox, MessageKind, Notifier, RESTART_BUTTON, UpdateDelivery,
    UpdateEvent, UpdateLifecycle, UpdateState,
};
pub use update_checker::UpdateInfo;
