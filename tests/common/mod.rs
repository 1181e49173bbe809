//! Shared integration test helpers for webnest.
//!
//! Fakes for the store, partition and process boundaries, plus factories
//! that wire a [`SessionManager`] over them.
//!
//! ```ignore
//! mod common;
//! use common::{memory_session, FlakyStore};
//! ```

#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use webnest::relaunch::ProcessBoundary;
use webnest::session::{
    DirectoryPartitions, PartitionBoundary, PartitionError, PartitionHandle, SessionManager,
    StorageKind,
};
use webnest::telemetry::{Telemetry, TelemetryEvent};
use webnest_store::{KeyValueStore, MemoryStore, StoreError, StorePath};

pub const CLEAR_TIMEOUT: Duration = Duration::from_secs(5);

/// A store whose writes can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Value {
        self.inner.snapshot()
    }

    fn check(&self) -> webnest_store::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: PathBuf::from("flaky.json"),
                source: std::io::Error::other("disk unavailable"),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, path: &StorePath) -> webnest_store::Result<Option<Value>> {
        self.inner.get(path)
    }

    fn set(&self, path: &StorePath, value: Value) -> webnest_store::Result<()> {
        self.check()?;
        self.inner.set(path, value)
    }

    fn has(&self, path: &StorePath) -> webnest_store::Result<bool> {
        self.inner.has(path)
    }

    fn unset(&self, path: &StorePath) -> webnest_store::Result<bool> {
        self.check()?;
        self.inner.unset(path)
    }
}

/// Session over a [`FlakyStore`] and real partition directories.
pub struct TestSession {
    pub store: Arc<FlakyStore>,
    pub partitions: Arc<DirectoryPartitions>,
    pub session: Arc<SessionManager>,
    pub temp: TempDir,
}

pub fn memory_session() -> TestSession {
    let temp = TempDir::new().expect("create temp dir");
    let store = Arc::new(FlakyStore::default());
    let partitions = Arc::new(DirectoryPartitions::new(temp.path().join("partitions")));
    let session = Arc::new(SessionManager::new(
        Arc::clone(&store) as Arc<dyn KeyValueStore>,
        Arc::clone(&partitions) as Arc<dyn PartitionBoundary>,
        CLEAR_TIMEOUT,
    ));
    TestSession {
        store,
        partitions,
        session,
        temp,
    }
}

/// How a [`ScriptedPartitions`] clear behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearBehavior {
    Succeed,
    Fail,
    Hang(Duration),
}

/// Partition boundary recording every clear request.
pub struct ScriptedPartitions {
    pub behavior: ClearBehavior,
    pub cleared: Arc<Mutex<Vec<(String, Vec<StorageKind>)>>>,
}

impl ScriptedPartitions {
    pub fn new(behavior: ClearBehavior) -> Self {
        Self {
            behavior,
            cleared: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

struct ScriptedHandle {
    name: String,
    behavior: ClearBehavior,
    cleared: Arc<Mutex<Vec<(String, Vec<StorageKind>)>>>,
}

impl PartitionBoundary for ScriptedPartitions {
    fn from_partition(&self, name: &str) -> Result<Arc<dyn PartitionHandle>, PartitionError> {
        Ok(Arc::new(ScriptedHandle {
            name: name.to_string(),
            behavior: self.behavior,
            cleared: Arc::clone(&self.cleared),
        }))
    }
}

impl PartitionHandle for ScriptedHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear_storage_data(&self, kinds: &[StorageKind]) -> Result<(), PartitionError> {
        match self.behavior {
            ClearBehavior::Succeed => {}
            ClearBehavior::Fail => {
                return Err(PartitionError::Io {
                    path: PathBuf::from(&self.name),
                    source: std::io::Error::other("storage locked"),
                });
            }
            ClearBehavior::Hang(duration) => std::thread::sleep(duration),
        }
        self.cleared.lock().push((self.name.clone(), kinds.to_vec()));
        Ok(())
    }

    fn write_entry(&self, _: StorageKind, _: &str, _: &[u8]) -> Result<(), PartitionError> {
        Ok(())
    }

    fn read_entry(&self, _: StorageKind, _: &str) -> Result<Option<Vec<u8>>, PartitionError> {
        Ok(None)
    }
}

/// Process boundary that records calls instead of acting on them.
#[derive(Default)]
pub struct FakeProcess {
    pub packaged: bool,
    pub fail_start: bool,
    pub calls: Mutex<Vec<ProcessCall>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCall {
    Relaunch(Vec<String>),
    SpawnDetached(Vec<String>),
    Exit(i32),
}

impl FakeProcess {
    pub fn packaged() -> Self {
        Self {
            packaged: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ProcessCall> {
        self.calls.lock().clone()
    }

    fn start(&self, call: ProcessCall) -> std::io::Result<()> {
        self.calls.lock().push(call);
        if self.fail_start {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "executable missing",
            ));
        }
        Ok(())
    }
}

impl ProcessBoundary for FakeProcess {
    fn is_packaged(&self) -> bool {
        self.packaged
    }

    fn current_exe(&self) -> std::io::Result<PathBuf> {
        Ok(PathBuf::from("/opt/webnest/webnest"))
    }

    fn relaunch(&self, _exe: &Path, args: &[String]) -> std::io::Result<()> {
        self.start(ProcessCall::Relaunch(args.to_vec()))
    }

    fn spawn_detached(&self, _exe: &Path, args: &[String]) -> std::io::Result<()> {
        self.start(ProcessCall::SpawnDetached(args.to_vec()))
    }

    fn exit(&self, code: i32) {
        self.calls.lock().push(ProcessCall::Exit(code));
    }
}

/// Telemetry sink that keeps every event.
#[derive(Default)]
pub struct RecordingTelemetry {
    pub events: Mutex<Vec<TelemetryEvent>>,
}

impl Telemetry for RecordingTelemetry {
    fn report(&self, event: TelemetryEvent) {
        self.events.lock().push(event);
    }
}
