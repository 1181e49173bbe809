// Library exports for the webnest binary and integration tests.
//
// # Lock usage
//
//   - `tokio::sync::Mutex`: the session writer lock; held across awaits.
//   - `parking_lot` locks: short sync-only sections (active pointer,
//     launch args, partition handle cache).

/// Application version (root crate version, passed down to sub-crates).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[macro_use]
pub mod debug;

pub mod app;
pub mod cli;
pub mod ipc;
pub mod notify;
pub mod relaunch;
pub mod session;
pub mod telemetry;
