use thiserror::Error;
use uuid::Uuid;

use crate::models::Role;

/// Error types for task state machine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from} on event {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Task {task_id} assigned to {role} has no higher role to escalate to")]
    NoEscalationTarget { task_id: Uuid, role: Role },

    #[error("Malformed task {task_id}: {reason}")]
    MalformedTask { task_id: Uuid, reason: String },
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;
