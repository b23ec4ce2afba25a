//! # Escalation Engine
//!
//! Ties the policy, the task state machine and the notification emitter together
//! behind the collaborator stores.
//!
//! ## Mutual exclusion
//!
//! The instance store persists whole instances, so the unit of mutual exclusion is the
//! owning instance. Sweeps and the manual entry points take the same per-instance
//! `tokio::sync::Mutex` from a `DashMap` registry, then re-read the instance from the
//! store. Whoever loses a race therefore sees the winner's saved state and the policy
//! or the state machine rejects the stale action.
//!
//! Notifications are built while the lock is held but appended only after the
//! instance has been saved, so a failed save never leaves notifications for
//! transitions that did not happen.
//!
//! Delivery is at most once. If the append fails after the save, the status guard
//! keeps the transition from firing again, so that notification is lost. Sweeps
//! record the failure in [`SweepReport::errors`]; manual entry points log it and
//! still return the committed task.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::EscalationConfig;
use crate::dependency_graph;
use crate::error::{EscalationError, Result};
use crate::events::NotificationPublisher;
use crate::logging::{log_error, log_sweep_summary, log_task_transition};
use crate::models::{
    NotificationRecord, NotificationType, Role, WorkflowInstance, WorkflowNode, WorkflowTask,
    WorkflowTemplate,
};
use crate::state_machine::{manual_event_for, TaskEvent, TaskState, TaskStateMachine};
use crate::store::{InstanceStore, NotificationStore};

use super::escalation_policy::{EscalationPolicy, PolicyDecision};
use super::notification_emitter::{EmissionKind, NotificationEmitter};
use super::task_initializer::{NewInstanceRequest, TaskInitializer};

/// A failure caught during a sweep. `instance_id` is `None` when the active instances
/// could not be loaded at all; `task_id` is `None` for instance-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepError {
    pub instance_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub error: EscalationError,
}

/// Summary of one sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub swept_at: DateTime<Utc>,
    pub instances_evaluated: usize,
    /// Status changes only; reminders are counted under notifications
    pub tasks_transitioned: usize,
    pub notifications_emitted: usize,
    pub instances_completed: usize,
    pub errors: Vec<SweepError>,
}

impl SweepReport {
    fn empty(swept_at: DateTime<Utc>) -> Self {
        Self {
            swept_at,
            instances_evaluated: 0,
            tasks_transitioned: 0,
            notifications_emitted: 0,
            instances_completed: 0,
            errors: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn absorb(&mut self, outcome: InstanceSweep) {
        if outcome.evaluated {
            self.instances_evaluated += 1;
        }
        self.tasks_transitioned += outcome.tasks_transitioned;
        self.notifications_emitted += outcome.notifications_emitted;
        if outcome.completed {
            self.instances_completed += 1;
        }
        self.errors.extend(outcome.errors);
    }
}

/// Per-instance sweep result, folded into the report
#[derive(Debug, Default)]
struct InstanceSweep {
    evaluated: bool,
    tasks_transitioned: usize,
    notifications_emitted: usize,
    completed: bool,
    errors: Vec<SweepError>,
}

impl InstanceSweep {
    fn record(&mut self, instance_id: Uuid, task_id: Option<Uuid>, error: EscalationError) {
        let context = match task_id {
            Some(task_id) => format!("instance_id={instance_id} task_id={task_id}"),
            None => format!("instance_id={instance_id}"),
        };
        log_error(
            "escalation_engine",
            "sweep",
            &error.to_string(),
            Some(context.as_str()),
        );
        self.errors.push(SweepError {
            instance_id: Some(instance_id),
            task_id,
            error,
        });
    }
}

pub struct EscalationEngine {
    config: EscalationConfig,
    policy: EscalationPolicy,
    instances: Arc<dyn InstanceStore>,
    notifications: Arc<dyn NotificationStore>,
    emitter: NotificationEmitter,
    initializer: TaskInitializer,
    instance_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    /// Bounds how many instances one sweep evaluates at once
    sweep_semaphore: Arc<Semaphore>,
}

impl std::fmt::Debug for EscalationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationEngine")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("tracked_locks", &self.instance_locks.len())
            .finish()
    }
}

impl EscalationEngine {
    pub fn new(
        config: EscalationConfig,
        instances: Arc<dyn InstanceStore>,
        notifications: Arc<dyn NotificationStore>,
    ) -> Result<Self> {
        config.validate()?;

        let publisher = NotificationPublisher::new(config.notification_channel_capacity);
        let emitter = NotificationEmitter::new(notifications.clone(), publisher);

        info!(
            sweep_interval_seconds = config.sweep_interval_seconds,
            max_concurrent_instances = config.max_concurrent_instances,
            "🏗️ ENGINE: Escalation engine created"
        );

        Ok(Self {
            policy: EscalationPolicy::new(&config),
            instances,
            notifications,
            emitter,
            initializer: TaskInitializer::new(),
            instance_locks: DashMap::new(),
            sweep_semaphore: Arc::new(Semaphore::new(config.max_concurrent_instances)),
            config,
        })
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Broadcast hook carrying every stored notification
    pub fn publisher(&self) -> &NotificationPublisher {
        self.emitter.publisher()
    }

    /// Number of instances with a live lock entry
    pub fn tracked_locks(&self) -> usize {
        self.instance_locks.len()
    }

    fn instance_lock(&self, instance_id: Uuid) -> Arc<Mutex<()>> {
        let entry = self
            .instance_locks
            .entry(instance_id)
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(entry.value())
    }

    fn release_lock_if_inactive(&self, instance: &WorkflowInstance) {
        if !instance.is_active() {
            self.instance_locks.remove(&instance.id);
        }
    }

    /// Re-read an instance for a manual mutation. Must be called with the instance
    /// lock held; unknown and inactive instances drop their lock entry.
    async fn load_active_for_update(&self, instance_id: Uuid) -> Result<WorkflowInstance> {
        let Some(instance) = self.instances.get_instance(instance_id).await? else {
            self.instance_locks.remove(&instance_id);
            return Err(EscalationError::InstanceNotFound(instance_id));
        };
        if !instance.is_active() {
            self.release_lock_if_inactive(&instance);
            return Err(EscalationError::InvalidState(format!(
                "instance {instance_id} is {}",
                instance.status
            )));
        }
        Ok(instance)
    }

    /// Evaluate every active instance once.
    ///
    /// Failures are isolated per task and per instance and returned in the report;
    /// nothing short of the instance listing failing stops the sweep, and even that
    /// is reported rather than returned.
    #[instrument(skip(self), fields(swept_at = %now))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let started = Instant::now();
        let mut report = SweepReport::empty(now);

        let active = match self.instances.load_active_instances().await {
            Ok(active) => active,
            Err(err) => {
                let error = EscalationError::from(err);
                log_error("escalation_engine", "load_active_instances", &error.to_string(), None);
                report.errors.push(SweepError {
                    instance_id: None,
                    task_id: None,
                    error,
                });
                log_sweep_summary(0, 0, 0, report.errors.len(), started.elapsed().as_millis());
                return report;
            }
        };

        debug!(active_instances = active.len(), "Sweeping active instances");

        let outcomes = join_all(active.iter().map(|instance| async move {
            match self.sweep_semaphore.acquire().await {
                Ok(_permit) => self.sweep_instance(instance.id, now).await,
                Err(e) => {
                    let mut outcome = InstanceSweep::default();
                    outcome.record(
                        instance.id,
                        None,
                        EscalationError::InvalidState(format!("sweep permits closed: {e}")),
                    );
                    outcome
                }
            }
        }))
        .await;

        for outcome in outcomes {
            report.absorb(outcome);
        }

        log_sweep_summary(
            report.instances_evaluated,
            report.tasks_transitioned,
            report.notifications_emitted,
            report.errors.len(),
            started.elapsed().as_millis(),
        );
        report
    }

    async fn sweep_instance(&self, instance_id: Uuid, now: DateTime<Utc>) -> InstanceSweep {
        let mut outcome = InstanceSweep::default();
        let lock = self.instance_lock(instance_id);
        let _guard = lock.lock().await;

        let mut instance = match self.instances.get_instance(instance_id).await {
            Ok(Some(instance)) if instance.is_active() => instance,
            Ok(Some(instance)) => {
                debug!(instance_id = %instance_id, status = %instance.status, "Instance no longer active");
                self.release_lock_if_inactive(&instance);
                return outcome;
            }
            Ok(None) => {
                outcome.record(
                    instance_id,
                    None,
                    EscalationError::InstanceNotFound(instance_id),
                );
                self.instance_locks.remove(&instance_id);
                return outcome;
            }
            Err(err) => {
                outcome.record(instance_id, None, err.into());
                return outcome;
            }
        };
        outcome.evaluated = true;

        let mut pending: Vec<NotificationRecord> = Vec::new();
        let mut transitioned = 0usize;

        for task in instance.tasks.iter_mut() {
            match self.evaluate_task(instance_id, task, now).await {
                Ok(Some((record, changed))) => {
                    if changed {
                        transitioned += 1;
                    }
                    pending.push(record);
                }
                Ok(None) => {}
                Err(err) => outcome.record(instance_id, Some(task.id), err),
            }
        }

        let completed = instance.complete_if_finished(now);
        if transitioned > 0 || completed {
            instance.updated_at = now;
            if let Err(err) = self.instances.save_instance(&instance).await {
                // Nothing was persisted, so none of the built notifications are valid
                outcome.record(instance_id, None, err.into());
                return outcome;
            }
        }
        outcome.tasks_transitioned = transitioned;
        outcome.completed = completed;

        for record in pending {
            let task_id = record.task_id;
            match self.emitter.deliver(record).await {
                Ok(_) => outcome.notifications_emitted += 1,
                Err(err) => outcome.record(instance_id, Some(task_id), err.into()),
            }
        }

        if completed {
            info!(instance_id = %instance_id, "🎉 ENGINE: Instance completed");
        }
        self.release_lock_if_inactive(&instance);
        outcome
    }

    /// Run the policy for one task and apply its decision in memory. Returns the
    /// notification to send and whether the task's status changed.
    async fn evaluate_task(
        &self,
        instance_id: Uuid,
        task: &mut WorkflowTask,
        now: DateTime<Utc>,
    ) -> Result<Option<(NotificationRecord, bool)>> {
        if task.status.is_terminal() || task.status.awaits_intervention() {
            return Ok(None);
        }

        let reminder_sent = if self.policy.in_reminder_window(task, now) {
            self.notifications
                .has_notification(task.id, NotificationType::Reminder)
                .await?
        } else {
            false
        };

        let decision = self.policy.evaluate(task, now, reminder_sent)?;
        let elapsed_minutes = EscalationPolicy::elapsed_minutes(task, now);

        let kind = match decision {
            PolicyDecision::NoAction => return Ok(None),
            PolicyDecision::Remind => {
                let record =
                    NotificationEmitter::build(task, instance_id, EmissionKind::Reminder, now);
                return Ok(Some((record, false)));
            }
            PolicyDecision::Escalate => EmissionKind::Escalation { elapsed_minutes },
            PolicyDecision::Warn => EmissionKind::Warning { elapsed_minutes },
            PolicyDecision::MarkOverdue => EmissionKind::Overdue,
        };

        let Some(event) = decision.event() else {
            return Ok(None);
        };
        let outcome = TaskStateMachine::new(task).transition(event, now)?;
        log_task_transition(
            instance_id,
            task.id,
            outcome.event_type,
            outcome.from,
            outcome.to,
            outcome.assigned_to,
        );

        let record = NotificationEmitter::build(task, instance_id, kind, now);
        Ok(Some((record, true)))
    }

    /// Apply a user-requested status change (`in_progress` or `completed`)
    #[instrument(skip(self, notes), fields(instance_id = %instance_id, task_id = %task_id))]
    pub async fn process_manual_transition(
        &self,
        instance_id: Uuid,
        task_id: Uuid,
        new_status: TaskState,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<WorkflowTask> {
        let event = manual_event_for(new_status, notes)?;
        let completion = matches!(event, TaskEvent::Complete(_));
        let kind = completion.then_some(EmissionKind::Completion);
        self.apply_manual_event(instance_id, task_id, event, kind, now)
            .await
    }

    /// Reassign a task to `new_assignee`, in either direction of the hierarchy
    #[instrument(skip(self), fields(instance_id = %instance_id, task_id = %task_id))]
    pub async fn process_manual_escalation(
        &self,
        instance_id: Uuid,
        task_id: Uuid,
        new_assignee: Role,
        now: DateTime<Utc>,
    ) -> Result<WorkflowTask> {
        self.apply_manual_event(
            instance_id,
            task_id,
            TaskEvent::Reassign(new_assignee),
            Some(EmissionKind::ManualEscalation),
            now,
        )
        .await
    }

    async fn apply_manual_event(
        &self,
        instance_id: Uuid,
        task_id: Uuid,
        event: TaskEvent,
        kind: Option<EmissionKind>,
        now: DateTime<Utc>,
    ) -> Result<WorkflowTask> {
        let lock = self.instance_lock(instance_id);
        let guard = lock.lock().await;

        let mut instance = self.load_active_for_update(instance_id).await?;
        let task = instance
            .task_mut(task_id)
            .ok_or(EscalationError::TaskNotFound {
                instance_id,
                task_id,
            })?;
        let outcome = TaskStateMachine::new(task).transition(event, now)?;
        log_task_transition(
            instance_id,
            task_id,
            outcome.event_type,
            outcome.from,
            outcome.to,
            outcome.assigned_to,
        );

        let updated = task.clone();
        let record = kind.map(|kind| NotificationEmitter::build(&updated, instance_id, kind, now));

        if instance.complete_if_finished(now) {
            info!(instance_id = %instance_id, "🎉 ENGINE: Instance completed");
        }
        instance.updated_at = now;
        self.instances.save_instance(&instance).await?;
        self.release_lock_if_inactive(&instance);
        drop(guard);

        // The transition is committed; a failed append must not be reported as a
        // failed transition.
        if let Some(record) = record {
            if let Err(err) = self.emitter.deliver(record).await {
                let context = format!("instance_id={instance_id} task_id={task_id}");
                log_error(
                    "escalation_engine",
                    "deliver_manual_notification",
                    &err.to_string(),
                    Some(context.as_str()),
                );
            }
        }
        Ok(updated)
    }

    /// Instantiate `template` and persist the new instance
    #[instrument(skip(self, template, request), fields(template_id = %template.id))]
    pub async fn start_instance(
        &self,
        template: &WorkflowTemplate,
        request: NewInstanceRequest,
        now: DateTime<Utc>,
    ) -> Result<WorkflowInstance> {
        let instance = self.initializer.build_instance(template, request, now)?;
        self.instances.save_instance(&instance).await?;

        info!(
            instance_id = %instance.id,
            task_count = instance.tasks.len(),
            "🚀 ENGINE: Instance started"
        );
        Ok(instance)
    }

    /// Cancel an active instance; it is skipped by every later sweep
    #[instrument(skip(self), fields(instance_id = %instance_id))]
    pub async fn cancel_instance(
        &self,
        instance_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<WorkflowInstance> {
        let lock = self.instance_lock(instance_id);
        let _guard = lock.lock().await;

        let mut instance = self.load_active_for_update(instance_id).await?;
        instance.cancel(now);
        self.instances.save_instance(&instance).await?;
        self.release_lock_if_inactive(&instance);

        warn!(instance_id = %instance_id, "🛑 ENGINE: Instance cancelled");
        Ok(instance)
    }

    /// Mark a notification read, optionally recording the action taken
    pub async fn acknowledge_notification(
        &self,
        notification_id: Uuid,
        action_taken: Option<String>,
        action_time: Option<DateTime<Utc>>,
    ) -> Result<NotificationRecord> {
        self.notifications
            .mark_read(notification_id, action_taken, action_time)
            .await?
            .ok_or(EscalationError::NotificationNotFound(notification_id))
    }

    pub async fn notifications_for_role(&self, role: Role) -> Result<Vec<NotificationRecord>> {
        Ok(self.notifications.list_by_role(role).await?)
    }

    pub fn validate_graph(&self, nodes: &[WorkflowNode]) -> Result<()> {
        Ok(dependency_graph::validate_graph(nodes)?)
    }

    /// Whether adding the edge (`target` depends on `source`) would close a cycle
    pub fn would_create_cycle(&self, nodes: &[WorkflowNode], source: &str, target: &str) -> bool {
        dependency_graph::would_create_cycle(nodes, source, target)
    }
}
