//! User-facing notifications.
//!
//! Only one notification is shown at a time: pushing a new one replaces the
//! current one. A notification disappears once its display interval has
//! elapsed or when it is dismissed by hand. One-shot CLI commands print
//! and drain the history instead, since they exit before anything expires.
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub shown_at: DateTime<Utc>,
}

/// Holds the notification currently on screen and a log of everything shown
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    display_for: Duration,
    current: Option<Notification>,
    history: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new(display_for: Duration) -> Self {
        Self {
            display_for,
            current: None,
            history: Vec::new(),
        }
    }

    /// Shows a notification now
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.push_at(severity, message, Utc::now());
    }

    pub fn push_at(&mut self, severity: Severity, message: impl Into<String>, now: DateTime<Utc>) {
        let notification = Notification {
            severity,
            message: message.into(),
            shown_at: now,
        };

        match severity {
            Severity::Error => error!("[notify] {}", notification.message),
            Severity::Warning => warn!("[notify] {}", notification.message),
            Severity::Success | Severity::Info => info!("[notify] {}", notification.message),
        }

        self.history.push(notification.clone());
        self.current = Some(notification);
    }

    /// The visible notification at `now`, if it has not expired
    pub fn current_at(&self, now: DateTime<Utc>) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|n| now - n.shown_at < self.display_for)
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current_at(Utc::now())
    }

    /// Dismisses the visible notification by hand
    pub fn dismiss(&mut self) {
        if let Some(n) = self.current.take() {
            debug!("Dismissed notification: {}", n.message);
        }
    }

    /// Every notification pushed so far, oldest first
    pub fn history(&self) -> &[Notification] {
        &self.history
    }

    /// The most recently pushed notification, expired or not
    pub fn last(&self) -> Option<&Notification> {
        self.history.last()
    }

    /// Drains the history, e.g. after the caller has rendered it
    pub fn take_history(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.history)
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::seconds(4))
    }
}
