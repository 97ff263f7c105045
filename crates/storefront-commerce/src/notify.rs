//! Fire-and-forget notifications.
//!
//! The core reports every user-visible outcome (promo applied, payment
//! failed, order placed, ...) through a [`NotificationSink`]. How those are
//! shown is up to the front end.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// The outcome a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    CartUpdated,
    PromoApplied,
    PromoRemoved,
    InvalidPromoCode,
    ValidationFailed,
    PaymentFailed,
    DuplicateSubmission,
    OrderPlaced,
    OrderVoided,
    CheckoutAbandoned,
    PreferencesUpdated,
    PersistenceCorruption,
    PersistenceFailed,
}

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEvent::CartUpdated => "cart_updated",
            NotificationEvent::PromoApplied => "promo_applied",
            NotificationEvent::PromoRemoved => "promo_removed",
            NotificationEvent::InvalidPromoCode => "invalid_promo_code",
            NotificationEvent::ValidationFailed => "validation_failed",
            NotificationEvent::PaymentFailed => "payment_failed",
            NotificationEvent::DuplicateSubmission => "duplicate_submission",
            NotificationEvent::OrderPlaced => "order_placed",
            NotificationEvent::OrderVoided => "order_voided",
            NotificationEvent::CheckoutAbandoned => "checkout_abandoned",
            NotificationEvent::PreferencesUpdated => "preferences_updated",
            NotificationEvent::PersistenceCorruption => "persistence_corruption",
            NotificationEvent::PersistenceFailed => "persistence_failed",
        }
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub event: NotificationEvent,
    pub message: String,
}

impl Notification {
    pub fn success(event: NotificationEvent, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            event,
            message: message.into(),
        }
    }

    pub fn error(event: NotificationEvent, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            event,
            message: message.into(),
        }
    }

    pub fn info(event: NotificationEvent, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            event,
            message: message.into(),
        }
    }
}

/// Receiver of notifications. Must never block or fail the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, n: Notification) {
        match n.kind {
            NotificationKind::Error => {
                tracing::warn!(event = %n.event, "{}", n.message)
            }
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!(event = %n.event, "{}", n.message)
            }
        }
    }
}

/// Forwards notifications into an unbounded channel.
///
/// Dropped receivers are ignored; the sender never waits.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    /// Create a sink and the receiving half the front end drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("notification receiver dropped");
        }
    }
}

/// Collects notifications in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    seen: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Events received so far, oldest first.
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.notifications().into_iter().map(|n| n.event).collect()
    }

    /// The most recent notification.
    pub fn last(&self) -> Option<Notification> {
        self.notifications().pop()
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}
