use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::models::{NotificationPayload, Role};

/// Broadcast hook for delivery collaborators (push, email, SMS).
///
/// The emitter publishes every stored notification here. Delivery is out of the
/// engine's hands: a missing or lagging subscriber never fails an emission.
#[derive(Debug, Clone)]
pub struct NotificationPublisher {
    sender: broadcast::Sender<PublishedNotification>,
}

/// Notification as seen by delivery subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedNotification {
    pub target_role: Role,
    pub payload: NotificationPayload,
    pub published_at: DateTime<Utc>,
}

impl NotificationPublisher {
    /// Create a new publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a payload addressed to `target_role`.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(
        &self,
        target_role: Role,
        payload: NotificationPayload,
        published_at: DateTime<Utc>,
    ) -> usize {
        let notification = PublishedNotification {
            target_role,
            payload,
            published_at,
        };

        // No subscribers is fine: records are already in the notification store
        self.sender.send(notification).unwrap_or(0)
    }

    /// Subscribe to notifications
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedNotification> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
