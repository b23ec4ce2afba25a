//! In-memory store implementations.
//!
//! Used by tests and by embedders that keep workflow state in process. Instances are
//! kept in a `DashMap` keyed by id; notifications in insertion order behind a
//! `parking_lot` lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{InstanceStore, NotificationStore, StoreResult};
use crate::models::{NotificationRecord, NotificationType, Role, WorkflowInstance};

#[derive(Debug, Default)]
pub struct InMemoryInstanceStore {
    instances: DashMap<Uuid, WorkflowInstance>,
}

impl InMemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
impl InstanceStore for InMemoryInstanceStore {
    async fn load_active_instances(&self) -> StoreResult<Vec<WorkflowInstance>> {
        let mut active: Vec<WorkflowInstance> = self
            .instances
            .iter()
            .filter(|entry| entry.value().is_active())
            .map(|entry| entry.value().clone())
            .collect();
        active.sort_by_key(|i| (i.created_at, i.id));
        Ok(active)
    }

    async fn save_instance(&self, instance: &WorkflowInstance) -> StoreResult<()> {
        self.instances.insert(instance.id, instance.clone());
        Ok(())
    }

    async fn get_instance(&self, id: Uuid) -> StoreResult<Option<WorkflowInstance>> {
        Ok(self.instances.get(&id).map(|entry| entry.value().clone()))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    records: RwLock<Vec<NotificationRecord>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record, oldest first
    pub fn all(&self) -> Vec<NotificationRecord> {
        self.records.read().clone()
    }

    pub fn count_for(&self, task_id: Uuid, notification_type: NotificationType) -> usize {
        self.records
            .read()
            .iter()
            .filter(|r| r.task_id == task_id && r.notification_type == notification_type)
            .count()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn append(&self, record: NotificationRecord) -> StoreResult<()> {
        self.records.write().push(record);
        Ok(())
    }

    async fn mark_read(
        &self,
        id: Uuid,
        action_taken: Option<String>,
        action_time: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<NotificationRecord>> {
        let mut records = self.records.write();
        Ok(records.iter_mut().find(|r| r.id == id).map(|record| {
            record.is_read = true;
            if action_taken.is_some() {
                record.action_taken = action_taken;
                record.action_time = action_time;
            }
            record.clone()
        }))
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<NotificationRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| r.target_role == role)
            .cloned()
            .collect())
    }

    async fn has_notification(
        &self,
        task_id: Uuid,
        notification_type: NotificationType,
    ) -> StoreResult<bool> {
        Ok(self
            .records
            .read()
            .iter()
            .any(|r| r.task_id == task_id && r.notification_type == notification_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InstanceStatus, WorkflowNode, WorkflowTask};

    fn instance(status: InstanceStatus) -> WorkflowInstance {
        let now = Utc::now();
        WorkflowInstance {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            name: "daily".into(),
            description: None,
            status,
            tasks: vec![WorkflowTask::from_node(
                &WorkflowNode::new("n", "Task", Role::Employee),
                now,
            )],
            start_time: now,
            end_time: None,
            created_by: "tester".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn record(task_id: Uuid, role: Role, notification_type: NotificationType) -> NotificationRecord {
        NotificationRecord {
            id: Uuid::new_v4(),
            task_id,
            instance_id: Uuid::new_v4(),
            notification_type,
            message: "msg".into(),
            target_role: role,
            sent_time: Utc::now(),
            is_read: false,
            action_taken: None,
            action_time: None,
        }
    }

    #[tokio::test]
    async fn test_load_active_filters_by_status() {
        let store = InMemoryInstanceStore::new();
        let active = instance(InstanceStatus::Active);
        store.save_instance(&active).await.unwrap();
        store
            .save_instance(&instance(InstanceStatus::Completed))
            .await
            .unwrap();
        store
            .save_instance(&instance(InstanceStatus::Cancelled))
            .await
            .unwrap();

        let loaded = store.load_active_instances().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, active.id);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_get_missing_instance() {
        let store = InMemoryInstanceStore::new();
        assert!(store.get_instance(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_notification_lookup_and_acknowledgement() {
        let store = InMemoryNotificationStore::new();
        let task_id = Uuid::new_v4();
        let reminder = record(task_id, Role::Employee, NotificationType::Reminder);
        let reminder_id = reminder.id;
        store.append(reminder).await.unwrap();
        store
            .append(record(task_id, Role::DirectSupervisor, NotificationType::Escalation))
            .await
            .unwrap();

        assert!(store
            .has_notification(task_id, NotificationType::Reminder)
            .await
            .unwrap());
        assert!(!store
            .has_notification(task_id, NotificationType::Warning)
            .await
            .unwrap());
        assert_eq!(store.list_by_role(Role::DirectSupervisor).await.unwrap().len(), 1);

        let now = Utc::now();
        let acked = store
            .mark_read(reminder_id, Some("started".into()), Some(now))
            .await
            .unwrap()
            .unwrap();
        assert!(acked.is_read);
        assert_eq!(acked.action_taken.as_deref(), Some("started"));
        assert_eq!(acked.action_time, Some(now));

        assert!(store
            .mark_read(Uuid::new_v4(), None, None)
            .await
            .unwrap()
            .is_none());
    }
}
