//! # Collaborator Stores
//!
//! The engine does not own persistence. It consumes an [`InstanceStore`] for workflow
//! instances and a [`NotificationStore`] for emitted notifications; both are held as
//! trait objects so deployments can plug in their own backends. In-memory
//! implementations live in [`memory`].

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NotificationRecord, NotificationType, Role, WorkflowInstance};

pub use memory::{InMemoryInstanceStore, InMemoryNotificationStore};

/// Failures reported by store backends. All are treated as transient by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Task/instance store consumed by the engine
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// All instances with status `active`
    async fn load_active_instances(&self) -> StoreResult<Vec<WorkflowInstance>>;

    /// Insert or replace an instance atomically
    async fn save_instance(&self, instance: &WorkflowInstance) -> StoreResult<()>;

    async fn get_instance(&self, id: Uuid) -> StoreResult<Option<WorkflowInstance>>;
}

/// Notification store consumed by the emitter and the acknowledgement interface
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn append(&self, record: NotificationRecord) -> StoreResult<()>;

    /// Mark a notification read, returning the updated record if it exists
    async fn mark_read(
        &self,
        id: Uuid,
        action_taken: Option<String>,
        action_time: Option<chrono::DateTime<chrono::Utc>>,
    ) -> StoreResult<Option<NotificationRecord>>;

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<NotificationRecord>>;

    /// Whether a notification of `notification_type` already exists for the task
    async fn has_notification(
        &self,
        task_id: Uuid,
        notification_type: NotificationType,
    ) -> StoreResult<bool>;
}
