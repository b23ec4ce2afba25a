//! # Notification Emitter
//!
//! Turns fired transitions into [`NotificationRecord`]s, appends them to the
//! notification store and hands the payload to the publisher for delivery
//! collaborators. The emitter never delivers anything itself.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::events::NotificationPublisher;
use crate::models::{NotificationRecord, NotificationType, Role, WorkflowTask};
use crate::store::{NotificationStore, StoreResult};

/// What happened to the task, as far as the notification is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmissionKind {
    Reminder,
    Escalation { elapsed_minutes: i64 },
    ManualEscalation,
    Warning { elapsed_minutes: i64 },
    Overdue,
    Completion,
}

impl EmissionKind {
    pub fn notification_type(self) -> NotificationType {
        match self {
            Self::Reminder => NotificationType::Reminder,
            Self::Escalation { .. } | Self::ManualEscalation => NotificationType::Escalation,
            Self::Warning { .. } | Self::Overdue => NotificationType::Warning,
            Self::Completion => NotificationType::Completion,
        }
    }
}

#[derive(Clone)]
pub struct NotificationEmitter {
    store: Arc<dyn NotificationStore>,
    publisher: NotificationPublisher,
}

impl std::fmt::Debug for NotificationEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationEmitter")
            .field("subscribers", &self.publisher.subscriber_count())
            .finish()
    }
}

impl NotificationEmitter {
    pub fn new(store: Arc<dyn NotificationStore>, publisher: NotificationPublisher) -> Self {
        Self { store, publisher }
    }

    /// Build the record for `kind`, addressed to whoever holds the task now.
    ///
    /// `task` must reflect the post-transition state so escalations target the new
    /// assignee.
    pub fn build(
        task: &WorkflowTask,
        instance_id: Uuid,
        kind: EmissionKind,
        now: DateTime<Utc>,
    ) -> NotificationRecord {
        NotificationRecord {
            id: Uuid::new_v4(),
            task_id: task.id,
            instance_id,
            notification_type: kind.notification_type(),
            message: message_for(task, kind),
            target_role: task.assigned_to,
            sent_time: now,
            is_read: false,
            action_taken: None,
            action_time: None,
        }
    }

    /// Build, store and publish a notification
    pub async fn emit(
        &self,
        task: &WorkflowTask,
        instance_id: Uuid,
        kind: EmissionKind,
        now: DateTime<Utc>,
    ) -> StoreResult<NotificationRecord> {
        let record = Self::build(task, instance_id, kind, now);
        self.deliver(record).await
    }

    /// Store and publish an already-built record
    pub async fn deliver(&self, record: NotificationRecord) -> StoreResult<NotificationRecord> {
        self.store.append(record.clone()).await?;
        let receivers = self
            .publisher
            .publish(record.target_role, record.payload(), record.sent_time);

        debug!(
            notification_id = %record.id,
            task_id = %record.task_id,
            notification_type = %record.notification_type,
            target_role = %record.target_role,
            receivers,
            "Notification emitted"
        );
        Ok(record)
    }

    pub fn publisher(&self) -> &NotificationPublisher {
        &self.publisher
    }
}

fn message_for(task: &WorkflowTask, kind: EmissionKind) -> String {
    let title = &task.title;
    match kind {
        EmissionKind::Reminder => format!("Reminder: {title} is scheduled to start now"),
        EmissionKind::Escalation { elapsed_minutes } => format!(
            "{title} has been overdue by {elapsed_minutes} minutes and escalated to {}",
            task.assigned_to
        ),
        EmissionKind::ManualEscalation => {
            format!("{title} has been manually reassigned to {}", task.assigned_to)
        }
        EmissionKind::Warning { elapsed_minutes } => format!(
            "Warning: {title} is still open {elapsed_minutes} minutes after its scheduled time"
        ),
        EmissionKind::Overdue => format!(
            "{title} is overdue: the {} minute time limit has elapsed and {} is the highest role",
            task.time_limit_minutes,
            Role::GeneralManager
        ),
        EmissionKind::Completion => format!("{title} has been completed"),
    }
}
