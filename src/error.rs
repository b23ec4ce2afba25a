//! Error types for the escalation engine.
//!
//! Component-level errors (graph validation, state machine, stores, configuration)
//! are defined next to their components and fold into [`EscalationError`] so that
//! engine entry points expose a single error type.

use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigurationError;
use crate::dependency_graph::GraphError;
use crate::state_machine::StateMachineError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscalationError {
    #[error("Dependency cycle detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Unknown node '{node_id}' referenced by '{referenced_by}'")]
    UnknownNode {
        node_id: String,
        referenced_by: String,
    },

    #[error("Duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("Workflow instance {0} not found")]
    InstanceNotFound(Uuid),

    #[error("Task {task_id} not found in instance {instance_id}")]
    TaskNotFound { instance_id: Uuid, task_id: Uuid },

    #[error("Notification {0} not found")]
    NotificationNotFound(Uuid),

    #[error("Transient store error: {0}")]
    TransientStore(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Malformed task {task_id}: {reason}")]
    MalformedTask { task_id: Uuid, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl EscalationError {
    /// True for the not-found family returned by the manual entry points
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InstanceNotFound(_) | Self::TaskNotFound { .. } | Self::NotificationNotFound(_)
        )
    }
}

impl From<GraphError> for EscalationError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Cycle { path } => Self::Cycle { path },
            GraphError::UnknownNode {
                node_id,
                referenced_by,
            } => Self::UnknownNode {
                node_id,
                referenced_by,
            },
            GraphError::DuplicateNode(id) => Self::DuplicateNode(id),
        }
    }
}

impl From<StateMachineError> for EscalationError {
    fn from(err: StateMachineError) -> Self {
        match err {
            StateMachineError::MalformedTask { task_id, reason } => {
                Self::MalformedTask { task_id, reason }
            }
            other => Self::InvalidTransition(other.to_string()),
        }
    }
}

impl From<StoreError> for EscalationError {
    fn from(err: StoreError) -> Self {
        Self::TransientStore(err.to_string())
    }
}

impl From<ConfigurationError> for EscalationError {
    fn from(err: ConfigurationError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EscalationError>;
