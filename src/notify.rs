//! Narrative notifications handed to the host.
//!
//! The core never presents messages itself. Systems buffer them while a turn
//! runs and the session flushes them to a [`NotificationSink`] once the
//! operation that produced them is complete.

use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    System,
    Warning,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub turn: u64,
    pub severity: Severity,
    pub message: String,
}

pub trait NotificationSink {
    fn notify(&mut self, notification: &Notification);
}

impl<F> NotificationSink for F
where
    F: FnMut(&Notification),
{
    fn notify(&mut self, notification: &Notification) {
        self(notification)
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _notification: &Notification) {}
}
