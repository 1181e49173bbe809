//! Process relaunch with preserved launch arguments.

use crate::telemetry::{Telemetry, TelemetryEvent, TelemetryKind};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use thiserror::Error;
use webnest_update::install;

/// Env override for packaged-mode detection (`0` or `1`).
pub const PACKAGED_ENV: &str = "WEBNEST_PACKAGED";

/// OS process boundary.
pub trait ProcessBoundary: Send + Sync {
    /// Whether this is a distribution-built run.
    fn is_packaged(&self) -> bool;

    fn current_exe(&self) -> std::io::Result<PathBuf>;

    /// Packaged restart primitive: start `exe` with `args`.
    fn relaunch(&self, exe: &Path, args: &[String]) -> std::io::Result<()>;

    /// Start `exe` with `args` as a process that outlives this one.
    fn spawn_detached(&self, exe: &Path, args: &[String]) -> std::io::Result<()>;

    /// Terminate the process. Test boundaries may return.
    fn exit(&self, code: i32);
}

#[derive(Debug, Error)]
pub enum RelaunchError {
    #[error("failed to resolve current executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    #[error("failed to relaunch {exe:?}: {source}")]
    Relaunch {
        exe: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn {exe:?}: {source}")]
    Spawn {
        exe: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a relaunch request ended in. Only observable when
/// [`ProcessBoundary::exit`] returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RelaunchOutcome {
    /// A new process was started and exit(0) requested.
    Restarted { packaged: bool, args: Vec<String> },
    /// Starting the new process failed; exit(1) requested.
    ExitedWithoutRestart { error: String },
}

/// Owns the captured launch arguments and performs restarts.
pub struct RelaunchCoordinator {
    args: RwLock<Vec<String>>,
    process: Arc<dyn ProcessBoundary>,
    telemetry: Arc<dyn Telemetry>,
}

impl RelaunchCoordinator {
    pub fn new(process: Arc<dyn ProcessBoundary>, telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            args: RwLock::new(Vec::new()),
            process,
            telemetry,
        }
    }

    pub fn get_launch_args(&self) -> Vec<String> {
        self.args.read().clone()
    }

    /// Replace the captured arguments with a copy of `args`.
    pub fn set_launch_args(&self, args: &[String]) {
        *self.args.write() = args.to_vec();
    }

    /// Restart with the captured arguments.
    pub fn relaunch(&self) -> RelaunchOutcome {
        let args = self.get_launch_args();
        self.relaunch_with_args(&args)
    }

    /// Restart the current executable with `args`, then exit.
    ///
    /// Packaged runs use the relaunch primitive; development runs spawn a
    /// detached sibling. If the new process cannot be started the failure is
    /// logged and reported, and the process exits with code 1 instead of
    /// vanishing silently.
    pub fn relaunch_with_args(&self, args: &[String]) -> RelaunchOutcome {
        let packaged = self.process.is_packaged();
        match self.start_new_process(packaged, args) {
            Ok(exe) => {
                log::info!(
                    "Relaunching {:?} with {:?} ({})",
                    exe,
                    args,
                    if packaged { "packaged" } else { "development" }
                );
                self.process.exit(0);
                RelaunchOutcome::Restarted {
                    packaged,
                    args: args.to_vec(),
                }
            }
            Err(e) => {
                log::error!("Relaunch failed, exiting without restart: {e}");
                self.telemetry
                    .report(TelemetryEvent::new(TelemetryKind::RelaunchFailed, e.to_string()));
                self.process.exit(1);
                RelaunchOutcome::ExitedWithoutRestart {
                    error: e.to_string(),
                }
            }
        }
    }

    fn start_new_process(&self, packaged: bool, args: &[String]) -> Result<PathBuf, RelaunchError> {
        let exe = self
            .process
            .current_exe()
            .map_err(RelaunchError::CurrentExe)?;

        if packaged {
            self.process
                .relaunch(&exe, args)
                .map_err(|source| RelaunchError::Relaunch {
                    exe: exe.clone(),
                    source,
                })?;
        } else {
            self.process
                .spawn_detached(&exe, args)
                .map_err(|source| RelaunchError::Spawn {
                    exe: exe.clone(),
                    source,
                })?;
        }
        Ok(exe)
    }
}

/// The real process.
pub struct OsProcess {
    packaged: bool,
}

impl OsProcess {
    /// Detect packaged mode from the executable location, honouring
    /// [`PACKAGED_ENV`].
    pub fn detect() -> Self {
        let packaged = match std::env::var(PACKAGED_ENV).ok().as_deref() {
            Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            _ => install::detect_installation().is_packaged(),
        };
        Self { packaged }
    }
}

impl ProcessBoundary for OsProcess {
    fn is_packaged(&self) -> bool {
        self.packaged
    }

    fn current_exe(&self) -> std::io::Result<PathBuf> {
        std::env::current_exe()
    }

    fn relaunch(&self, exe: &Path, args: &[String]) -> std::io::Result<()> {
        Command::new(exe).args(args).spawn().map(|_| ())
    }

    fn spawn_detached(&self, exe: &Path, args: &[String]) -> std::io::Result<()> {
        let mut command = Command::new(exe);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        // The child is not waited on; dropping the handle does not kill it.
        command.spawn().map(|_| ())
    }

    fn exit(&self, code: i32) {
        std::process::exit(code);
    }
}
