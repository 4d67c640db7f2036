//! Notification collaborator
//!
//! The core emits events (order created/shipped/delivered, password reset
//! requested) and hands them to a [`Notifier`]. Delivery is best effort:
//! [`dispatch`] logs a failed send and carries on, so a notification problem
//! never undoes the state change that produced it.

use crate::error::NotifierError;
use crate::model::{Order, OrderStatus, User};

/// Who an event is addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub username: String,
    pub email: String,
}

impl From<&User> for Recipient {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Created,
    Shipped,
    Delivered,
}

impl OrderEvent {
    /// The event an admin status change produces, if any
    pub fn for_status(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Pending => None,
            OrderStatus::Shipped => Some(Self::Shipped),
            OrderStatus::Delivered => Some(Self::Delivered),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Order {
        event: OrderEvent,
        recipient: Recipient,
        order: Order,
    },
    PasswordResetRequested {
        recipient: Recipient,
    },
}

impl Notification {
    pub fn recipient(&self) -> &Recipient {
        match self {
            Self::Order { recipient, .. } | Self::PasswordResetRequested { recipient } => recipient,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order {
                event: OrderEvent::Created,
                ..
            } => "Order Confirmation",
            Self::Order {
                event: OrderEvent::Shipped,
                ..
            } => "Order Shipped",
            Self::Order {
                event: OrderEvent::Delivered,
                ..
            } => "Order Delivered",
            Self::PasswordResetRequested { .. } => "Password Reset Request",
        }
    }
}

/// Sends notifications on behalf of the core
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), NotifierError>;
}

/// Default notifier: writes each notification to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifierError> {
        let recipient = notification.recipient();
        if recipient.email.is_empty() {
            return Err(NotifierError::NoRecipient(recipient.username.clone()));
        }
        match notification {
            Notification::Order { order, .. } => tracing::info!(
                to = %recipient.email,
                subject = notification.subject(),
                order_id = %order.order_id,
                total_price = %order.total_price,
                "Notification sent"
            ),
            Notification::PasswordResetRequested { .. } => tracing::info!(
                to = %recipient.email,
                subject = notification.subject(),
                "Notification sent"
            ),
        }
        Ok(())
    }
}

/// Fire-and-forget delivery: failures are logged and swallowed
pub fn dispatch(notifier: &dyn Notifier, notification: Notification) {
    if let Err(err) = notifier.send(&notification) {
        tracing::warn!(
            error = %err,
            to = %notification.recipient().username,
            subject = notification.subject(),
            "Notification failed"
        );
    }
}
