use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Initial state when the task is instantiated
    #[default]
    Pending,
    /// Task has been started by its assignee
    InProgress,
    /// Task completed; the only terminal state
    Completed,
    /// Task was reassigned up the hierarchy, by timer or by hand
    Escalated,
    /// Visibility flag raised after the warning threshold
    Warning,
    /// Time limit elapsed with nobody left to escalate to
    Overdue,
}

impl TaskState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// States a timed escalation may fire from
    pub fn can_escalate(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Overdue tasks wait for manual intervention and are skipped by the timer
    pub fn awaits_intervention(&self) -> bool {
        matches!(self, Self::Overdue)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Escalated => write!(f, "escalated"),
            Self::Warning => write!(f, "warning"),
            Self::Overdue => write!(f, "overdue"),
        }
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "escalated" => Ok(Self::Escalated),
            "warning" => Ok(Self::Warning),
            "overdue" => Ok(Self::Overdue),
            _ => Err(format!("Invalid task state: {s}")),
        }
    }
}
