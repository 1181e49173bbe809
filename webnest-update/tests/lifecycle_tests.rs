//! Tests for the update lifecycle state machine using fake collaborators.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use webnest_update::{
    LATER_BUTTON, MessageBox, MessageKind, Notifier, RESTART_BUTTON, UpdateDelivery, UpdateEvent,
    UpdateInfo, UpdateLifecycle, UpdateState,
};

#[derive(Default)]
struct FakeDelivery {
    checks: AtomicUsize,
    installs: AtomicUsize,
    fail_check: bool,
    fail_install: bool,
}

impl UpdateDelivery for FakeDelivery {
    fn check_for_updates_and_notify(&self) -> anyhow::Result<()> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if self.fail_check {
            anyhow::bail!("network unreachable");
        }
        Ok(())
    }

    fn quit_and_install(&self) -> anyhow::Result<()> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        if self.fail_install {
            anyhow::bail!("disk full");
        }
        Ok(())
    }
}

struct FakeNotifier {
    answer: Option<usize>,
    shown: Mutex<Vec<MessageBox>>,
}

impl FakeNotifier {
    fn answering(answer: Option<usize>) -> Self {
        Self {
            answer,
            shown: Mutex::new(Vec::new()),
        }
    }
}

impl Notifier for FakeNotifier {
    fn show_message_box(&self, message: &MessageBox) -> Option<usize> {
        self.shown.lock().push(message.clone());
        if message.buttons.is_empty() {
            Some(0)
        } else {
            self.answer
        }
    }
}

fn info() -> UpdateInfo {
    UpdateInfo {
        version: "v0.5.0".to_string(),
        url: "https://releases.example.com/webnest-0.5.0".to_string(),
        notes: Some("Bug fixes".to_string()),
        published_at: None,
    }
}

fn lifecycle(
    delivery: &Arc<FakeDelivery>,
    notifier: &Arc<FakeNotifier>,
) -> UpdateLifecycle {
    UpdateLifecycle::new(
        Arc::clone(delivery) as Arc<dyn UpdateDelivery>,
        Arc::clone(notifier) as Arc<dyn Notifier>,
    )
}

#[test]
fn test_start_issues_single_check() {
    let delivery = Arc::new(FakeDelivery::default());
    let notifier = Arc::new(FakeNotifier::answering(None));
    let lifecycle = lifecycle(&delivery, &notifier);

    assert_eq!(lifecycle.state(), UpdateState::Idle);
    assert!(lifecycle.start());
    assert_eq!(lifecycle.state(), UpdateState::Checking);
    assert!(!lifecycle.start());
    assert_eq!(delivery.checks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_update_available_shows_info_notice() {
    let delivery = Arc::new(FakeDelivery::default());
    let notifier = Arc::new(FakeNotifier::answering(None));
    let lifecycle = lifecycle(&delivery, &notifier);

    lifecycle.start();
    lifecycle.handle_event(UpdateEvent::UpdateAvailable(info()));

    assert_eq!(lifecycle.state(), UpdateState::UpdateAvailable);
    let shown = notifier.shown.lock();
    assert_eq!(shown.len(), 1);
    assert!(shown[0].buttons.is_empty());
    assert!(shown[0].message.contains("0.5.0"));
    assert_eq!(delivery.installs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_downloaded_restart_installs() {
    let delivery = Arc::new(FakeDelivery::default());
    let notifier = Arc::new(FakeNotifier::answering(Some(RESTART_BUTTON)));
    let lifecycle = lifecycle(&delivery, &notifier);

    lifecycle.start();
    lifecycle.handle_event(UpdateEvent::UpdateAvailable(info()));
    lifecycle.handle_event(UpdateEvent::UpdateDownloaded(info()));

    assert_eq!(lifecycle.state(), UpdateState::Restarting);
    assert_eq!(delivery.installs.load(Ordering::SeqCst), 1);
    let shown = notifier.shown.lock();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[1].buttons, vec!["Restart".to_string(), "Later".to_string()]);
}

#[test]
fn test_downloaded_later_defers() {
    let delivery = Arc::new(FakeDelivery::default());
    let notifier = Arc::new(FakeNotifier::answering(Some(LATER_BUTTON)));
    let lifecycle = lifecycle(&delivery, &notifier);

    lifecycle.start();
    lifecycle.handle_event(UpdateEvent::UpdateDownloaded(info()));

    assert_eq!(lifecycle.state(), UpdateState::Downloaded);
    assert_eq!(delivery.installs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_dismissed_prompt_defers() {
    let delivery = Arc::new(FakeDelivery::default());
    let notifier = Arc::new(FakeNotifier::answering(None));
    let lifecycle = lifecycle(&delivery, &notifier);

    lifecycle.start();
    lifecycle.handle_event(UpdateEvent::UpdateDownloaded(info()));

    assert_eq!(lifecycle.state(), UpdateState::Downloaded);
    assert_eq!(delivery.installs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_events_before_start_are_ignored() {
    let delivery = Arc::new(FakeDelivery::default());
    let notifier = Arc::new(FakeNotifier::answering(Some(RESTART_BUTTON)));
    let lifecycle = lifecycle(&delivery, &notifier);

    lifecycle.handle_event(UpdateEvent::UpdateAvailable(info()));
    lifecycle.handle_event(UpdateEvent::UpdateDownloaded(info()));

    assert_eq!(lifecycle.state(), UpdateState::Idle);
    assert!(notifier.shown.lock().is_empty());
    assert_eq!(delivery.installs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_errors_reach_hook_without_state_change() {
    let delivery = Arc::new(FakeDelivery {
        fail_check: true,
        ..Default::default()
    });
    let notifier = Arc::new(FakeNotifier::answering(None));
    let errors = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&errors);
    let lifecycle = lifecycle(&delivery, &notifier)
        .with_error_hook(move |message| sink.lock().push(message.to_string()));

    assert!(lifecycle.start());
    lifecycle.handle_event(UpdateEvent::Error("feed returned 503".to_string()));

    assert_eq!(lifecycle.state(), UpdateState::Checking);
    let errors = errors.lock();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("network unreachable"));
    assert_eq!(errors[1], "feed returned 503");
}

#[test]
fn test_failed_install_returns_to_downloaded() {
    let delivery = Arc::new(FakeDelivery {
        fail_install: true,
        ..Default::default()
    });
    let notifier = Arc::new(FakeNotifier::answering(Some(RESTART_BUTTON)));
    let lifecycle = lifecycle(&delivery, &notifier);

    lifecycle.start();
    lifecycle.handle_event(UpdateEvent::UpdateDownloaded(info()));

    assert_eq!(delivery.installs.load(Ordering::SeqCst), 1);
    assert_eq!(lifecycle.state(), UpdateState::Downloaded);

    let shown = notifier.shown.lock();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[1].kind, MessageKind::Warning);
    assert!(shown[1].buttons.is_empty());
    assert!(shown[1].detail.as_deref().unwrap().contains("disk full"));
}

#[test]
fn test_event_pump_drains_channel() {
    let delivery = Arc::new(FakeDelivery::default());
    let notifier = Arc::new(FakeNotifier::answering(Some(LATER_BUTTON)));
    let lifecycle = Arc::new(lifecycle(&delivery, &notifier));
    lifecycle.start();

    let (tx, rx) = mpsc::channel();
    let pump = lifecycle.spawn_event_pump(rx);
    tx.send(UpdateEvent::UpdateAvailable(info())).unwrap();
    tx.send(UpdateEvent::UpdateDownloaded(info())).unwrap();
    drop(tx);
    pump.join().unwrap();

    assert_eq!(lifecycle.state(), UpdateState::Downloaded);
    assert_eq!(notifier.shown.lock().len(), 2);
}
