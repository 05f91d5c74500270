//! Single-slot transient notifications.
//!
//! At most one notification is visible. Showing a new one replaces the
//! current one and invalidates its expiry handle, so a stale timer firing
//! later cannot clear the newer message.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::settings::DEFAULT_NOTIFICATION_MS;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

/// A message shown to the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Identifies one `show` call. Only the latest handle can expire the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationHandle(u64);

#[derive(Debug, Clone)]
enum Slot {
    Idle,
    Showing {
        notification: Notification,
        handle: NotificationHandle,
        expires_at: Instant,
    },
}

/// The notification slot state machine: `Idle` or `Showing`.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    slot: Slot,
    next_handle: u64,
    default_duration: Duration,
}

impl NotificationQueue {
    /// Create an idle queue with the given default lifetime.
    pub fn new(default_duration: Duration) -> Self {
        Self {
            slot: Slot::Idle,
            next_handle: 0,
            default_duration,
        }
    }

    /// Show a notification for the default duration.
    pub fn show(&mut self, message: impl Into<String>, severity: Severity) -> NotificationHandle {
        self.show_at(message, severity, None, Instant::now())
    }

    /// Show a notification for a specific duration.
    pub fn show_for(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        duration: Duration,
    ) -> NotificationHandle {
        self.show_at(message, severity, Some(duration), Instant::now())
    }

    /// Show a notification as of `now`. Replaces whatever is showing.
    pub fn show_at(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        duration: Option<Duration>,
        now: Instant,
    ) -> NotificationHandle {
        self.next_handle += 1;
        let handle = NotificationHandle(self.next_handle);
        let notification = Notification::new(message, severity);
        tracing::debug!(severity = severity.as_str(), message = %notification.message, "notification shown");

        self.slot = Slot::Showing {
            notification,
            handle,
            expires_at: now + duration.unwrap_or(self.default_duration),
        };
        handle
    }

    /// Expiry timer callback. Clears the slot only if `handle` is still current.
    pub fn expire(&mut self, handle: NotificationHandle) -> bool {
        match &self.slot {
            Slot::Showing { handle: current, .. } if *current == handle => {
                self.slot = Slot::Idle;
                true
            }
            _ => false,
        }
    }

    /// Expire by deadline. Returns whether the slot was cleared.
    pub fn poll(&mut self, now: Instant) -> bool {
        match &self.slot {
            Slot::Showing { expires_at, .. } if *expires_at <= now => {
                self.slot = Slot::Idle;
                true
            }
            _ => false,
        }
    }

    /// Clear the slot immediately.
    pub fn dismiss(&mut self) {
        self.slot = Slot::Idle;
    }

    /// The visible notification, if any.
    pub fn current(&self) -> Option<&Notification> {
        match &self.slot {
            Slot::Idle => None,
            Slot::Showing { notification, .. } => Some(notification),
        }
    }

    /// Handle of the visible notification.
    pub fn current_handle(&self) -> Option<NotificationHandle> {
        match &self.slot {
            Slot::Idle => None,
            Slot::Showing { handle, .. } => Some(*handle),
        }
    }

    /// When the visible notification expires.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.slot {
            Slot::Idle => None,
            Slot::Showing { expires_at, .. } => Some(*expires_at),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.slot, Slot::Idle)
    }

    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_NOTIFICATION_MS))
    }
}
