use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Events that can trigger task state transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TaskEvent {
    /// Assignee started working on the task
    Start,
    /// Explicit completion, with optional notes
    Complete(Option<String>),
    /// Timed escalation to the next role above the current holder
    Escalate,
    /// Warning threshold crossed
    Warn,
    /// Time limit elapsed with no escalation target left
    MarkOverdue,
    /// Manual reassignment to an explicit role
    Reassign(Role),
}

impl TaskEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete(_) => "complete",
            Self::Escalate => "escalate",
            Self::Warn => "warn",
            Self::MarkOverdue => "mark_overdue",
            Self::Reassign(_) => "reassign",
        }
    }
}
