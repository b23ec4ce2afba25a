//! # Escalation Policy
//!
//! Decides which timed transition, if any, fires for a task on this tick.
//!
//! The policy is a pure function of the task, the current time, and whether a reminder
//! has already been recorded for the task. It keeps no state of its own: repeat firing
//! within a window is prevented by the task's current status (escalation, warning,
//! overdue) or by the existence of a reminder notification.
//!
//! Elapsed time is counted in whole minutes truncated toward zero. Thresholds are
//! matched against half-open windows (`[threshold, threshold + width)`) because the
//! policy runs on a fixed tick rather than continuously. A tick delayed past the end of
//! a window misses that firing. Window widths are configurable, and the guards above
//! keep a wider window from firing twice.

use chrono::{DateTime, Utc};

use crate::config::EscalationConfig;
use crate::models::WorkflowTask;
use crate::state_machine::{StateMachineError, StateMachineResult, TaskEvent, TaskState};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Outcome of evaluating one task on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    NoAction,
    /// Emit a reminder; status is unchanged
    Remind,
    Escalate,
    Warn,
    MarkOverdue,
}

impl PolicyDecision {
    /// State machine event for decisions that change status
    pub fn event(self) -> Option<TaskEvent> {
        match self {
            Self::Escalate => Some(TaskEvent::Escalate),
            Self::Warn => Some(TaskEvent::Warn),
            Self::MarkOverdue => Some(TaskEvent::MarkOverdue),
            Self::NoAction | Self::Remind => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    reminder_window_minutes: i64,
    firing_window_minutes: i64,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            reminder_window_minutes: 1,
            firing_window_minutes: 1,
        }
    }
}

impl EscalationPolicy {
    pub fn new(config: &EscalationConfig) -> Self {
        Self {
            reminder_window_minutes: config.reminder_window_minutes,
            firing_window_minutes: config.firing_window_minutes,
        }
    }

    /// Whole minutes since the scheduled time, truncated toward zero
    pub fn elapsed_minutes(task: &WorkflowTask, now: DateTime<Utc>) -> i64 {
        (now - task.scheduled_time).num_milliseconds() / MILLIS_PER_MINUTE
    }

    /// Whether `now` falls inside the task's reminder window. Lets callers skip the
    /// reminder lookup on ticks where it cannot matter.
    pub fn in_reminder_window(&self, task: &WorkflowTask, now: DateTime<Utc>) -> bool {
        now >= task.scheduled_time
            && in_window(
                Self::elapsed_minutes(task, now),
                0,
                self.reminder_window_minutes,
            )
    }

    /// Evaluate `task` at `now`. First matching rule wins.
    pub fn evaluate(
        &self,
        task: &WorkflowTask,
        now: DateTime<Utc>,
        reminder_sent: bool,
    ) -> StateMachineResult<PolicyDecision> {
        task.check_timestamps()
            .map_err(|reason| StateMachineError::MalformedTask {
                task_id: task.id,
                reason,
            })?;

        if task.status == TaskState::Completed || task.status.awaits_intervention() {
            return Ok(PolicyDecision::NoAction);
        }

        // Truncation maps the last minute before the scheduled time to 0, so compare
        // the raw instants first.
        if now < task.scheduled_time {
            return Ok(PolicyDecision::NoAction);
        }

        let elapsed = Self::elapsed_minutes(task, now);

        if !reminder_sent && in_window(elapsed, 0, self.reminder_window_minutes) {
            return Ok(PolicyDecision::Remind);
        }

        let escalation_after = i64::from(task.escalation_after_minutes);
        if in_window(elapsed, escalation_after, self.firing_window_minutes)
            && task.status.can_escalate()
            && task.assigned_to.next().is_some()
        {
            return Ok(PolicyDecision::Escalate);
        }

        let warning_after = i64::from(task.warning_after_minutes);
        if in_window(elapsed, warning_after, self.firing_window_minutes)
            && task.status != TaskState::Warning
        {
            return Ok(PolicyDecision::Warn);
        }

        if elapsed >= i64::from(task.time_limit_minutes) && task.assigned_to.is_top() {
            return Ok(PolicyDecision::MarkOverdue);
        }

        Ok(PolicyDecision::NoAction)
    }
}

fn in_window(elapsed: i64, start: i64, width: i64) -> bool {
    elapsed >= start && elapsed < start + width
}
