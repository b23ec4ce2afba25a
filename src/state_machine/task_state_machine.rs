use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::{
    errors::{StateMachineError, StateMachineResult},
    events::TaskEvent,
    states::TaskState,
};
use crate::models::{Role, WorkflowTask};

/// Applied transition, as reported back to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub task_id: Uuid,
    pub from: TaskState,
    pub to: TaskState,
    pub event_type: &'static str,
    pub previous_assignee: Role,
    pub assigned_to: Role,
}

impl TransitionOutcome {
    pub fn reassigned(&self) -> bool {
        self.previous_assignee != self.assigned_to
    }
}

/// Task state machine operating on a borrowed task.
///
/// Callers must hold the task's mutual-exclusion scope for the lifetime of the
/// machine; the machine itself does no locking.
pub struct TaskStateMachine<'a> {
    task: &'a mut WorkflowTask,
}

impl<'a> TaskStateMachine<'a> {
    pub fn new(task: &'a mut WorkflowTask) -> Self {
        Self { task }
    }

    pub fn current_state(&self) -> TaskState {
        self.task.status
    }

    /// Attempt to transition the task, mutating it on success
    pub fn transition(
        &mut self,
        event: TaskEvent,
        now: DateTime<Utc>,
    ) -> StateMachineResult<TransitionOutcome> {
        let from = self.task.status;
        let previous_assignee = self.task.assigned_to;
        let target = self.determine_target_state(from, &event)?;
        let assignee = self.determine_assignee(&event)?;

        self.task.status = target;
        self.task.assigned_to = assignee;
        self.apply_side_effects(&event, now);

        debug!(
            task_id = %self.task.id,
            from = %from,
            to = %target,
            event = event.event_type(),
            assigned_to = %assignee,
            "Task transition applied"
        );

        Ok(TransitionOutcome {
            task_id: self.task.id,
            from,
            to: target,
            event_type: event.event_type(),
            previous_assignee,
            assigned_to: assignee,
        })
    }

    /// Determine the target state based on current state and event
    fn determine_target_state(
        &self,
        current_state: TaskState,
        event: &TaskEvent,
    ) -> StateMachineResult<TaskState> {
        use TaskState::*;

        let target = match (current_state, event) {
            (Pending, TaskEvent::Start) => InProgress,

            (Pending | InProgress | Escalated | Warning | Overdue, TaskEvent::Complete(_)) => {
                Completed
            }

            (Pending | InProgress, TaskEvent::Escalate) => Escalated,

            (Pending | InProgress | Escalated | Overdue, TaskEvent::Warn) => Warning,

            (Pending | InProgress | Escalated | Warning, TaskEvent::MarkOverdue) => Overdue,

            (from_state, TaskEvent::Reassign(_)) if !from_state.is_terminal() => Escalated,

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: from_state.to_string(),
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }

    /// Resolve who holds the task after the event, checking escalation guards
    fn determine_assignee(&self, event: &TaskEvent) -> StateMachineResult<Role> {
        let current = self.task.assigned_to;
        match event {
            TaskEvent::Escalate => current
                .next()
                .ok_or(StateMachineError::NoEscalationTarget {
                    task_id: self.task.id,
                    role: current,
                }),
            TaskEvent::MarkOverdue if !current.is_top() => {
                Err(StateMachineError::InvalidTransition {
                    from: self.task.status.to_string(),
                    event: format!("mark_overdue while {current} can still escalate"),
                })
            }
            TaskEvent::Reassign(role) => Ok(*role),
            _ => Ok(current),
        }
    }

    fn apply_side_effects(&mut self, event: &TaskEvent, now: DateTime<Utc>) {
        match event {
            TaskEvent::Start => {
                self.task.start_time = Some(now);
            }
            TaskEvent::Complete(notes) => {
                self.task.completion_time = Some(now);
                if notes.is_some() {
                    self.task.notes = notes.clone();
                }
            }
            _ => {}
        }
    }

    pub fn task(&self) -> &WorkflowTask {
        &*self.task
    }
}

/// Map a status requested through the manual entry point to an event
pub fn manual_event_for(status: TaskState, notes: Option<String>) -> StateMachineResult<TaskEvent> {
    match status {
        TaskState::InProgress => Ok(TaskEvent::Start),
        TaskState::Completed => Ok(TaskEvent::Complete(notes)),
        other => Err(StateMachineError::InvalidTransition {
            from: "manual".to_string(),
            event: format!("set status {other}"),
        }),
    }
}
