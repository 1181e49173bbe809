//! Process-scoped application context.
//!
//! Built once at startup; owns every controller and hands shared references
//! to the IPC handler and CLI commands.

use crate::ipc::IpcHandler;
use crate::relaunch::{OsProcess, ProcessBoundary, RelaunchCoordinator};
use crate::session::{DirectoryPartitions, SessionManager};
use crate::telemetry::{self, Telemetry, TelemetryEvent, TelemetryKind};
use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use webnest_config::{Config, ProfileId};
use webnest_store::{FileStore, KeyValueStore, MemoryStore};
use webnest_update::update_checker;
use webnest_update::{Notifier, ReleaseFeed, UpdateLifecycle};

/// Startup options resolved from the command line.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub config_path: Option<PathBuf>,
    pub ephemeral: bool,
    pub check_updates: bool,
    pub profile: Option<String>,
}

pub struct AppContext {
    pub config: Config,
    config_path: PathBuf,
    options: AppOptions,
    pub session: Arc<SessionManager>,
    pub relaunch: Arc<RelaunchCoordinator>,
    pub updates: Arc<UpdateLifecycle>,
    pub telemetry: Arc<dyn Telemetry>,
    update_events: Mutex<Option<mpsc::Receiver<webnest_update::UpdateEvent>>>,
    ephemeral_dir: Option<PathBuf>,
}

impl AppContext {
    /// Load configuration and wire every component. Update notices go to
    /// `notifier`.
    pub fn build(options: AppOptions, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let config_path = options
            .config_path
            .clone()
            .unwrap_or_else(Config::config_path);
        let config = Config::load_from(&config_path)?;
        let telemetry = telemetry::from_config(&config);
        let process: Arc<dyn ProcessBoundary> = Arc::new(OsProcess::detect());

        let (store, partitions_root, ephemeral_dir) =
            if options.ephemeral {
                let dir = std::env::temp_dir()
                    .join(format!("webnest-ephemeral-{}", uuid::Uuid::new_v4()));
                log::info!("Ephemeral run; partitions in {:?}", dir);
                (
                    Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>,
                    dir.clone(),
                    Some(dir),
                )
            } else {
                let store_path = config.store_path();
                let store = FileStore::open(&store_path)
                    .with_context(|| format!("Failed to open store {:?}", store_path))?;
                (
                    Arc::new(store) as Arc<dyn KeyValueStore>,
                    config.partitions_path(),
                    None,
                )
            };

        let partitions = Arc::new(DirectoryPartitions::new(partitions_root));
        let session = Arc::new(SessionManager::new(
            store,
            partitions,
            config.storage_clear_timeout(),
        ));
        let relaunch = Arc::new(RelaunchCoordinator::new(
            Arc::clone(&process),
            Arc::clone(&telemetry),
        ));

        let (tx, rx) = mpsc::channel();
        let staging = Config::data_dir().join("updates").join("webnest.staged");
        let restart_process = Arc::clone(&process);
        // Update restarts start the new binary with no arguments, unlike relaunch.
        let feed = ReleaseFeed::new(
            config.updates.feed_url.clone(),
            crate::VERSION,
            staging,
            tx,
            move || restart_clean(restart_process.as_ref()),
        );
        let error_telemetry = Arc::clone(&telemetry);
        let updates = Arc::new(
            UpdateLifecycle::new(Arc::new(feed), notifier).with_error_hook(move |message| {
                error_telemetry.report(TelemetryEvent::new(TelemetryKind::UpdateError, message))
            }),
        );

        Ok(Self {
            config,
            config_path,
            options,
            session,
            relaunch,
            updates,
            telemetry,
            update_events: Mutex::new(Some(rx)),
            ephemeral_dir,
        })
    }

    /// Startup priming: capture launch args, restore the active profile,
    /// then apply `--profile`.
    pub async fn prime(&self) -> Result<()> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        self.relaunch.set_launch_args(&args);

        let restored = self
            .session
            .load_active_profile()
            .await
            .context("Failed to load the active profile")?;
        log::info!("Active profile at startup: {:?}", restored);

        if let Some(id) = &self.options.profile {
            let id = ProfileId::new(id.as_str());
            if self.session.get_profile(&id).await?.is_none() {
                bail!("Profile '{id}' does not exist");
            }
            self.session.set_active_profile(Some(id)).await?;
        }
        Ok(())
    }

    /// Begin the update flow if a check is due (or forced).
    ///
    /// Returns whether a check was started.
    pub fn start_updates(&mut self) -> Result<bool> {
        let due = self.options.check_updates
            || update_checker::should_check(
                self.config.updates.update_check_frequency,
                self.config.updates.last_update_check.as_deref(),
            );
        if !due {
            log::info!("Update check not due");
            return Ok(false);
        }

        if let Some(events) = self.update_events.get_mut().take() {
            self.updates.spawn_event_pump(events);
        }
        let started = self.updates.start();

        if started && !self.options.ephemeral {
            self.config.updates.last_update_check = Some(update_checker::current_timestamp());
            self.config
                .save_to(&self.config_path)
                .context("Failed to record update check time")?;
        }
        Ok(started)
    }

    pub fn ipc_handler(&self) -> IpcHandler {
        IpcHandler::new(
            Arc::clone(&self.session),
            Arc::clone(&self.relaunch),
            Some(Arc::clone(&self.updates)),
            Arc::clone(&self.telemetry),
        )
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        if let Some(dir) = &self.ephemeral_dir
            && let Err(e) = std::fs::remove_dir_all(dir)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            log::warn!("Failed to remove ephemeral partitions {:?}: {}", dir, e);
        }
    }
}

fn restart_clean(process: &dyn ProcessBoundary) {
    match process.current_exe() {
        Ok(exe) => {
            if let Err(e) = process.relaunch(&exe, &[]) {
                log::error!("Failed to start updated binary {:?}: {}", exe, e);
                process.exit(1);
                return;
            }
            process.exit(0);
        }
        Err(e) => {
            log::error!("Failed to resolve updated binary: {e}");
            process.exit(1);
        }
    }
}
