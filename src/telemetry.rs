//! Crash/error telemetry.
//!
//! The shell only ever calls [`Telemetry::report`]. Where the event ends up
//! depends on the configured sink.

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;
use webnest_config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TelemetryKind {
    UpdateError,
    RelaunchFailed,
    StorageClearFailed,
    IpcError,
}

/// One reported event.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    pub id: Uuid,
    /// RFC 3339
    pub timestamp: String,
    pub kind: TelemetryKind,
    pub message: String,
}

impl TelemetryEvent {
    pub fn new(kind: TelemetryKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now().to_rfc3339(),
            kind,
            message: message.into(),
        }
    }
}

pub trait Telemetry: Send + Sync {
    fn report(&self, event: TelemetryEvent);
}

/// Writes events to the debug log only.
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn report(&self, event: TelemetryEvent) {
        log::error!("[telemetry {:?}] {} ({})", event.kind, event.message, event.id);
    }
}

/// Discards events.
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn report(&self, _event: TelemetryEvent) {}
}

/// Appends events as JSON lines, and logs them.
pub struct FileTelemetry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTelemetry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn append(&self, event: &TelemetryEvent) -> std::io::Result<()> {
        let line = serde_json::to_string(event)?;
        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl Telemetry for FileTelemetry {
    fn report(&self, event: TelemetryEvent) {
        LogTelemetry.report(event.clone());
        if let Err(e) = self.append(&event) {
            log::warn!("Failed to write telemetry to {:?}: {}", self.path, e);
        }
    }
}

/// The sink selected by `telemetry.enabled`.
pub fn from_config(config: &Config) -> Arc<dyn Telemetry> {
    if config.telemetry.enabled {
        Arc::new(FileTelemetry::new(config.telemetry_path()))
    } else {
        Arc::new(LogTelemetry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_telemetry_appends_json_lines() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("logs").join("telemetry.jsonl");
        let telemetry = FileTelemetry::new(&path);

        telemetry.report(TelemetryEvent::new(TelemetryKind::UpdateError, "feed down"));
        telemetry.report(TelemetryEvent::new(TelemetryKind::RelaunchFailed, "spawn failed"));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "update-error");
        assert_eq!(lines[1]["message"], "spawn failed");
        assert_ne!(lines[0]["id"], lines[1]["id"]);
    }
}
