//! Update lifecycle state machine.
//!
//! One [`UpdateLifecycle`] exists per process. It alone advances the
//! [`UpdateState`]; the only triggers are the initial [`UpdateLifecycle::start`]
//! call and [`UpdateEvent`]s delivered by the update collaborator.
//!
//! The restart path calls [`UpdateDelivery::quit_and_install`] directly. It
//! does not go through the shell's launch-argument preserving relaunch, so an
//! update restart always starts the new binary with a clean argument list.

use crate::update_checker::UpdateInfo;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

/// Index of the "Restart" button in the downloaded prompt.
pub const RESTART_BUTTON: usize = 0;

/// Index of the "Later" button in the downloaded prompt.
pub const LATER_BUTTON: usize = 1;

/// Where the process is in the update flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateState {
    Idle,
    Checking,
    UpdateAvailable,
    Downloaded,
    Restarting,
}

/// Signals from the update collaborator.
#[derive(Debug, Clone)]
pub enum UpdateEvent {
    UpdateAvailable(UpdateInfo),
    UpdateNotAvailable,
    UpdateDownloaded(UpdateInfo),
    Error(String),
}

/// Update-delivery boundary: fetches, stages and applies releases.
pub trait UpdateDelivery: Send + Sync {
    /// Start a check. Results arrive later as [`UpdateEvent`]s.
    fn check_for_updates_and_notify(&self) -> anyhow::Result<()>;

    /// Quit the running process and install the staged release.
    fn quit_and_install(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
}

/// A modal message box request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBox {
    pub kind: MessageKind,
    pub title: String,
    pub message: String,
    pub detail: Option<String>,
    /// Button labels; empty means a single acknowledge button.
    pub buttons: Vec<String>,
}

/// Notification boundary: shows a modal and returns the chosen button index.
///
/// `None` means the box was dismissed without a choice.
pub trait Notifier: Send + Sync {
    fn show_message_box(&self, message: &MessageBox) -> Option<usize>;
}

type ErrorHook = Box<dyn Fn(&str) + Send + Sync>;

/// Drives the update flow and prompts the user at the downloaded stage.
pub struct UpdateLifecycle {
    state: Mutex<UpdateState>,
    delivery: Arc<dyn UpdateDelivery>,
    notifier: Arc<dyn Notifier>,
    on_error: Option<ErrorHook>,
}

impl UpdateLifecycle {
    pub fn new(delivery: Arc<dyn UpdateDelivery>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Mutex::new(UpdateState::Idle),
            delivery,
            notifier,
            on_error: None,
        }
    }

    /// Forward collaborator errors (e.g. to telemetry) in addition to logging.
    pub fn with_error_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    pub fn state(&self) -> UpdateState {
        *self.state.lock()
    }

    /// Idle → Checking. Issues one check request; later calls are no-ops.
    ///
    /// Returns whether a check was issued. A failed request is logged and
    /// leaves the state at Checking; it is not retried.
    pub fn start(&self) -> bool {
        {
            let mut state = self.state.lock();
            if *state != UpdateState::Idle {
                log::debug!("Update check already started (state {:?})", *state);
                return false;
            }
            *state = UpdateState::Checking;
        }

        log::info!("Checking for updates");
        if let Err(e) = self.delivery.check_for_updates_and_notify() {
            self.report_error(&format!("Update check failed: {e:#}"));
        }
        true
    }

    /// Apply one collaborator signal.
    pub fn handle_event(&self, event: UpdateEvent) {
        match event {
            UpdateEvent::UpdateAvailable(info) => self.on_update_available(&info),
            UpdateEvent::UpdateNotAvailable => {
                log::info!("No update available");
            }
            UpdateEvent::UpdateDownloaded(info) => self.on_update_downloaded(&info),
            UpdateEvent::Error(message) => self.report_error(&message),
        }
    }

    /// Feed events from `events` into [`Self::handle_event`] on a dedicated
    /// thread until the sending side is dropped.
    pub fn spawn_event_pump(self: &Arc<Self>, events: Receiver<UpdateEvent>) -> JoinHandle<()> {
        let lifecycle = Arc::clone(self);
        std::thread::spawn(move || {
            for event in events {
                lifecycle.handle_event(event);
            }
            log::debug!("Update event channel closed");
        })
    }

    fn on_update_available(&self, info: &UpdateInfo) {
        if !self.transition(&[UpdateState::Checking], UpdateState::UpdateAvailable) {
            return;
        }
        log::info!("Update available: {}", info.version);

        let notice = MessageBox {
            kind: MessageKind::Info,
            title: "Update available".to_string(),
            message: format!(
                "Version {} is available and is being downloaded in the background.",
                info.display_version()
            ),
            detail: info.notes.clone(),
            buttons: Vec::new(),
        };
        let _ = self.notifier.show_message_box(&notice);
    }

    fn on_update_downloaded(&self, info: &UpdateInfo) {
        if !self.transition(
            &[UpdateState::Checking, UpdateState::UpdateAvailable],
            UpdateState::Downloaded,
        ) {
            return;
        }
        log::info!("Update downloaded: {}", info.version);

        let prompt = MessageBox {
            kind: MessageKind::Info,
            title: "Update ready".to_string(),
            message: format!(
                "Version {} has been downloaded. Restart now to apply it?",
                info.display_version()
            ),
            detail: None,
            buttons: vec!["Restart".to_string(), "Later".to_string()],
        };

        match self.notifier.show_message_box(&prompt) {
            Some(RESTART_BUTTON) => self.restart(),
            _ => log::info!("Update restart deferred until next launch"),
        }
    }

    fn restart(&self) {
        if !self.transition(&[UpdateState::Downloaded], UpdateState::Restarting) {
            return;
        }
        log::info!("Restarting to apply update");
        if let Err(e) = self.delivery.quit_and_install() {
            self.report_error(&format!("Failed to install update: {e:#}"));
            *self.state.lock() = UpdateState::Downloaded;

            let warning = MessageBox {
                kind: MessageKind::Warning,
                title: "Update failed".to_string(),
                message: "The update could not be installed. It will be retried on the next launch."
                    .to_string(),
                detail: Some(format!("{e:#}")),
                buttons: Vec::new(),
            };
            let _ = self.notifier.show_message_box(&warning);
        }
    }

    /// Move to `to` if the current state is one of `from`.
    fn transition(&self, from: &[UpdateState], to: UpdateState) -> bool {
        let mut state = self.state.lock();
        if !from.contains(&*state) {
            log::warn!("Ignoring update transition {:?} -> {:?}", *state, to);
            return false;
        }
        *state = to;
        true
    }

    fn report_error(&self, message: &str) {
        log::warn!("{message}");
        if let Some(hook) = &self.on_error {
            hook(message);
        }
    }
}
