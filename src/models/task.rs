use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::node::WorkflowNode;
use super::role::Role;
use crate::state_machine::TaskState;

/// Instance-level execution of one [`WorkflowNode`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTask {
    pub id: Uuid,
    pub node_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    pub status: TaskState,
    pub assigned_to: Role,
    /// Role the task was created for; never mutated
    pub original_assignee: Role,
    pub time_limit_minutes: u32,
    pub escalation_after_minutes: u32,
    pub warning_after_minutes: u32,
    pub scheduled_time: DateTime<Utc>,
    pub reminder_time: DateTime<Utc>,
    pub escalation_time: DateTime<Utc>,
    pub warning_time: DateTime<Utc>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl WorkflowTask {
    /// Instantiate a task for `node`, deriving all timestamps once from `scheduled_time`
    pub fn from_node(node: &WorkflowNode, scheduled_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            node_id: node.id.clone(),
            title: node.title.clone(),
            description: None,
            category: node.category.clone(),
            status: TaskState::Pending,
            assigned_to: node.responsible_role,
            original_assignee: node.responsible_role,
            time_limit_minutes: node.time_limit_minutes,
            escalation_after_minutes: node.escalation_after_minutes,
            warning_after_minutes: node.warning_after_minutes,
            scheduled_time,
            reminder_time: scheduled_time
                - Duration::minutes(i64::from(node.reminder_before_minutes)),
            escalation_time: scheduled_time
                + Duration::minutes(i64::from(node.escalation_after_minutes)),
            warning_time: scheduled_time + Duration::minutes(i64::from(node.warning_after_minutes)),
            start_time: None,
            completion_time: None,
            notes: None,
        }
    }

    /// End of the permissible window
    pub fn deadline(&self) -> DateTime<Utc> {
        self.scheduled_time + Duration::minutes(i64::from(self.time_limit_minutes))
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskState::Completed
    }

    /// Check the timestamp invariants, returning a description of the first violation
    pub fn check_timestamps(&self) -> Result<(), String> {
        if self.reminder_time > self.scheduled_time {
            return Err(format!(
                "reminder time {} is after scheduled time {}",
                self.reminder_time, self.scheduled_time
            ));
        }
        if self.escalation_time < self.scheduled_time {
            return Err(format!(
                "escalation time {} is before scheduled time {}",
                self.escalation_time, self.scheduled_time
            ));
        }
        if self.warning_time < self.scheduled_time {
            return Err(format!(
                "warning time {} is before scheduled time {}",
                self.warning_time, self.scheduled_time
            ));
        }
        Ok(())
    }
}
