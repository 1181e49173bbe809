//! Configuration system for the webnest desktop shell.
//!
//! This crate provides:
//!
//! - [`Config`]: the YAML configuration file, its defaults, and persistence
//! - [`Profile`] / [`ProfileId`] / [`ProfileColor`]: the profile identity record
//!   stored by the session layer
//! - Shared enums such as [`LogLevel`] and [`UpdateCheckFrequency`]

pub mod config;
pub mod defaults;
pub mod error;
pub mod persistence;
pub mod profile;
mod types;

pub use config::{Config, TelemetryConfig, UpdateConfig};
pub use error::ConfigError;
pub use profile::{Profile, ProfileColor, ProfileId};
pub use types::{LogLevel, UpdateCheckFrequency};
