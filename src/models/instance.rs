use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::task::WorkflowTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A running execution of a workflow template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    pub id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: InstanceStatus,
    pub tasks: Vec<WorkflowTask>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowInstance {
    pub fn is_active(&self) -> bool {
        self.status == InstanceStatus::Active
    }

    pub fn task(&self, task_id: Uuid) -> Option<&WorkflowTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: Uuid) -> Option<&mut WorkflowTask> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// True when the instance has tasks and every one of them is completed
    pub fn all_tasks_completed(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(WorkflowTask::is_completed)
    }

    /// Mark the instance completed if it is active and its last task has completed.
    ///
    /// Returns whether the status flipped.
    pub fn complete_if_finished(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_active() && self.all_tasks_completed() {
            self.status = InstanceStatus::Completed;
            self.end_time = Some(now);
            self.updated_at = now;
            return true;
        }
        false
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = InstanceStatus::Cancelled;
        self.end_time = Some(now);
        self.updated_at = now;
    }
}
