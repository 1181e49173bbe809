//! Modal notices for the update lifecycle.
//!
//! Native dialogs must be shown from the main thread on some platforms, while
//! update events arrive on a background thread. [`dialog_channel`] connects
//! the two: the background side holds a [`MainThreadNotifier`] and the main
//! thread drains the [`DialogQueue`].

use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;
use webnest_update::{LATER_BUTTON, MessageBox, MessageKind, Notifier};

/// How often the main thread checks for completion between dialog requests.
const QUEUE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Native message boxes via `rfd`.
pub struct DialogNotifier;

impl Notifier for DialogNotifier {
    fn show_message_box(&self, message: &MessageBox) -> Option<usize> {
        let level = match message.kind {
            MessageKind::Info => MessageLevel::Info,
            MessageKind::Warning => MessageLevel::Warning,
        };
        let description = match &message.detail {
            Some(detail) => format!("{}\n\n{}", message.message, detail),
            None => message.message.clone(),
        };

        let buttons = match message.buttons.as_slice() {
            [] => MessageButtons::Ok,
            [only] => MessageButtons::OkCustom(only.clone()),
            [first, second, ..] => MessageButtons::OkCancelCustom(first.clone(), second.clone()),
        };

        let result = MessageDialog::new()
            .set_level(level)
            .set_title(&message.title)
            .set_description(&description)
            .set_buttons(buttons)
            .show();

        button_index(&message.buttons, result)
    }
}

/// Map a dialog result back to an index into `buttons`.
fn button_index(buttons: &[String], result: MessageDialogResult) -> Option<usize> {
    match result {
        MessageDialogResult::Ok | MessageDialogResult::Yes => Some(0),
        MessageDialogResult::Cancel | MessageDialogResult::No if buttons.len() > 1 => Some(1),
        MessageDialogResult::Custom(label) => buttons.iter().position(|b| *b == label),
        _ => None,
    }
}

/// Headless notifier: logs the notice and answers "Later".
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_message_box(&self, message: &MessageBox) -> Option<usize> {
        log::info!("{}: {}", message.title, message.message);
        if message.buttons.is_empty() {
            None
        } else {
            Some(LATER_BUTTON)
        }
    }
}

struct DialogRequest {
    message: MessageBox,
    reply: Sender<Option<usize>>,
}

/// Create a connected notifier/queue pair.
pub fn dialog_channel() -> (MainThreadNotifier, DialogQueue) {
    let (tx, rx) = mpsc::channel();
    (MainThreadNotifier { requests: tx }, DialogQueue { requests: rx })
}

/// Forwards message boxes to the thread running the paired [`DialogQueue`]
/// and blocks until it answers.
pub struct MainThreadNotifier {
    requests: Sender<DialogRequest>,
}

impl Notifier for MainThreadNotifier {
    fn show_message_box(&self, message: &MessageBox) -> Option<usize> {
        let (reply, answer) = mpsc::channel();
        let request = DialogRequest {
            message: message.clone(),
            reply,
        };
        if self.requests.send(request).is_err() {
            log::warn!("Dialog queue closed; dropping notice '{}'", message.title);
            return None;
        }
        answer.recv().unwrap_or_else(|_| {
            log::warn!("Dialog queue stopped before answering '{}'", message.title);
            None
        })
    }
}

/// Main-thread side of [`dialog_channel`].
pub struct DialogQueue {
    requests: Receiver<DialogRequest>,
}

impl DialogQueue {
    /// Answer dialog requests with `shower` on the calling thread until a
    /// value arrives on `done`, then return it.
    ///
    /// Returns `None` if `done` is disconnected without a value.
    pub fn run_until<T>(&self, shower: &dyn Notifier, done: &Receiver<T>) -> Option<T> {
        loop {
            match done.try_recv() {
                Ok(value) => return Some(value),
                Err(TryRecvError::Disconnected) => return None,
                Err(TryRecvError::Empty) => {}
            }

            match self.requests.recv_timeout(QUEUE_POLL_INTERVAL) {
                Ok(request) => {
                    let answer = shower.show_message_box(&request.message);
                    // The requester may have given up; nothing to do then.
                    let _ = request.reply.send(answer);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return done.recv().ok(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restart_later() -> Vec<String> {
        vec!["Restart".to_string(), "Later".to_string()]
    }

    #[test]
    fn test_button_index() {
        let buttons = restart_later();
        assert_eq!(button_index(&buttons, MessageDialogResult::Ok), Some(0));
        assert_eq!(button_index(&buttons, MessageDialogResult::Cancel), Some(1));
        assert_eq!(
            button_index(&buttons, MessageDialogResult::Custom("Later".to_string())),
            Some(1)
        );
        assert_eq!(
            button_index(&buttons, MessageDialogResult::Custom("Other".to_string())),
            None
        );
        assert_eq!(button_index(&[], MessageDialogResult::Cancel), None);
    }

    struct ThreadRecorder {
        threads: parking_lot::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl Notifier for ThreadRecorder {
        fn show_message_box(&self, message: &MessageBox) -> Option<usize> {
            self.threads.lock().push(std::thread::current().id());
            Some(message.buttons.len())
        }
    }

    #[test]
    fn test_dialogs_run_on_queue_thread() {
        let (notifier, queue) = dialog_channel();
        let (done_tx, done_rx) = mpsc::channel();
        let worker = std::thread::spawn(move || {
            let prompt = MessageBox {
                kind: MessageKind::Info,
                title: "Update ready".to_string(),
                message: "Restart?".to_string(),
                detail: None,
                buttons: restart_later(),
            };
            let answer = notifier.show_message_box(&prompt);
            done_tx.send(answer).unwrap();
        });

        let recorder = ThreadRecorder {
            threads: parking_lot::Mutex::new(Vec::new()),
        };
        assert_eq!(queue.run_until(&recorder, &done_rx), Some(Some(2)));
        worker.join().unwrap();
        assert_eq!(*recorder.threads.lock(), vec![std::thread::current().id()]);
    }

    #[test]
    fn test_closed_queue_answers_none() {
        let (notifier, queue) = dialog_channel();
        drop(queue);
        let notice = MessageBox {
            kind: MessageKind::Warning,
            title: "Update failed".to_string(),
            message: "Could not install".to_string(),
            detail: None,
            buttons: Vec::new(),
        };
        assert_eq!(notifier.show_message_box(&notice), None);
    }

    #[test]
    fn test_log_notifier_defers() {
        let prompt = MessageBox {
            kind: MessageKind::Info,
            title: "Update ready".to_string(),
            message: "Restart?".to_string(),
            detail: None,
            buttons: restart_later(),
        };
        assert_eq!(LogNotifier.show_message_box(&prompt), Some(LATER_BUTTON));
    }
}
