//! Fire-and-forget notification side channel.
//!
//! Nothing in the command core reads a notification back; sinks may drop them.

use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Notification {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub duration_ms: u64,
}

pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Routes notifications into the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => log::error!("{}", notification.message),
            NotificationKind::Warning => log::warn!("{}", notification.message),
            NotificationKind::Success | NotificationKind::Info => {
                log::info!("{}", notification.message)
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Keeps every notification; used by tests and by hosts that batch toasts.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.received.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.borrow().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.borrow_mut().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notification {
            message: "one".to_string(),
            kind: NotificationKind::Success,
            duration_ms: 3000,
        });
        notifier.notify(Notification {
            message: "two".to_string(),
            kind: NotificationKind::Error,
            duration_ms: 3000,
        });
        let received = notifier.take();
        assert_eq!(received.len(), 2);
        assert_eq!(received[1].kind, NotificationKind::Error);
        assert!(notifier.is_empty());
    }

    #[test]
    fn notification_uses_type_key_on_the_wire() {
        let json = serde_json::to_value(Notification {
            message: "saved".to_string(),
            kind: NotificationKind::Info,
            duration_ms: 1500,
        })
        .unwrap();
        assert_eq!(json["type"], "info");
    }
}
