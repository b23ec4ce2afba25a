#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Workflow Escalation
//!
//! Task lifecycle, time-based escalation and dependency-graph validation for
//! role-assigned operational workflows.
//!
//! ## Overview
//!
//! A workflow template is a DAG of nodes, each owned by a role in a fixed hierarchy
//! (`员工` → `直属管理` → `门店副总` → `总经理`). Starting an instance turns every node
//! into a scheduled task. A periodic sweep then walks all active instances and, per
//! task, decides whether a reminder, escalation, warning or overdue transition is due.
//! Escalations hand the task to the next role up; once nothing is left above, a task
//! that runs past its time limit becomes overdue and waits for a person.
//!
//! ## Module Organization
//!
//! - [`models`] - Roles, nodes, templates, tasks, instances and notifications
//! - [`dependency_graph`] - Cycle and reference validation for node sets
//! - [`state_machine`] - Task states, events and the transition table
//! - [`orchestration`] - Policy, emitter, engine and the periodic scheduler
//! - [`store`] - Collaborator store traits and in-memory implementations
//! - [`events`] - Broadcast hook for notification delivery
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use workflow_escalation::{
//!     EscalationConfig, EscalationEngine, InMemoryInstanceStore, InMemoryNotificationStore,
//!     NewInstanceRequest, Role, WorkflowNode, WorkflowTemplate,
//! };
//!
//! # async fn example() -> workflow_escalation::Result<()> {
//! let template = WorkflowTemplate::new(
//!     "Store opening",
//!     vec![
//!         WorkflowNode::new("unlock", "Unlock doors", Role::Employee),
//!         WorkflowNode::new("float", "Count float", Role::Employee).depends_on(["unlock"]),
//!     ],
//! )?;
//!
//! let engine = EscalationEngine::new(
//!     EscalationConfig::default(),
//!     Arc::new(InMemoryInstanceStore::new()),
//!     Arc::new(InMemoryNotificationStore::new()),
//! )?;
//!
//! let now = Utc::now();
//! engine
//!     .start_instance(&template, NewInstanceRequest::new("Monday", "ops", now), now)
//!     .await?;
//!
//! let report = engine.sweep(Utc::now()).await;
//! println!("{} notifications emitted", report.notifications_emitted);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod dependency_graph;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigManager, ConfigurationError, EscalationConfig};
pub use dependency_graph::{check_edge, topological_order, validate_graph, would_create_cycle};
pub use dependency_graph::{GraphError, GraphResult};
pub use error::{EscalationError, Result};
pub use events::{NotificationPublisher, PublishedNotification};
pub use models::{
    InstanceStatus, NotificationPayload, NotificationRecord, NotificationType, Role,
    WorkflowInstance, WorkflowNode, WorkflowTask, WorkflowTemplate,
};
pub use orchestration::{
    EscalationEngine, EscalationPolicy, EscalationScheduler, NewInstanceRequest, PolicyDecision,
    SweepError, SweepReport,
};
pub use state_machine::{TaskEvent, TaskState, TaskStateMachine, TransitionOutcome};
pub use store::{
    InMemoryInstanceStore, InMemoryNotificationStore, InstanceStore, NotificationStore,
    StoreError, StoreResult,
};
