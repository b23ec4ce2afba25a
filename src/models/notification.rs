use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Reminder,
    Escalation,
    Warning,
    Completion,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reminder => write!(f, "reminder"),
            Self::Escalation => write!(f, "escalation"),
            Self::Warning => write!(f, "warning"),
            Self::Completion => write!(f, "completion"),
        }
    }
}

/// Notification produced by the emitter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: Uuid,
    pub task_id: Uuid,
    pub instance_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub target_role: Role,
    pub sent_time: DateTime<Utc>,
    pub is_read: bool,
    #[serde(default)]
    pub action_taken: Option<String>,
    #[serde(default)]
    pub action_time: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// Payload shape consumed by the reminder-check endpoint and push collaborators
    pub fn payload(&self) -> NotificationPayload {
        NotificationPayload {
            notification_type: self.notification_type,
            message: self.message.clone(),
            item_id: Some(self.task_id),
            new_assignee: match self.notification_type {
                NotificationType::Escalation => Some(self.target_role),
                _ => None,
            },
        }
    }
}

/// Wire contract: `{ type, message, itemId?, newAssignee? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_assignee: Option<Role>,
}
