//! Serde default helpers for [`crate::Config`].

use crate::types::{LogLevel, UpdateCheckFrequency};

pub fn storage_clear_timeout_secs() -> u64 {
    10
}

pub fn log_level() -> LogLevel {
    LogLevel::Info
}

pub fn update_check_frequency() -> UpdateCheckFrequency {
    UpdateCheckFrequency::Daily
}

pub fn feed_url() -> String {
    "https://releases.webnest.dev/latest.json".to_string()
}

pub fn bool_true() -> bool {
    true
}
