//! # Data Model
//!
//! Template-level nodes, running instances with their tasks, notification records
//! and the role hierarchy tasks escalate along.

pub mod instance;
pub mod node;
pub mod notification;
pub mod role;
pub mod task;

// Re-export core models for easy access
pub use instance::{InstanceStatus, WorkflowInstance};
pub use node::{WorkflowNode, WorkflowTemplate};
pub use notification::{NotificationPayload, NotificationRecord, NotificationType};
pub use role::Role;
pub use task::WorkflowTask;
