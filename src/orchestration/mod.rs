//! # Orchestration
//!
//! Time-driven side of the crate: deciding which transitions are due, applying them
//! under per-instance mutual exclusion and emitting the matching notifications.
//!
//! ## Core Components
//!
//! - [`EscalationPolicy`]: pure decision function for one task on one tick
//! - [`NotificationEmitter`]: builds, stores and publishes notification records
//! - [`TaskInitializer`]: instantiates templates with dependency-derived schedules
//! - [`EscalationEngine`]: sweeps plus the manual entry points
//! - [`EscalationScheduler`]: periodic driver for the engine

pub mod escalation_engine;
pub mod escalation_policy;
pub mod notification_emitter;
pub mod scheduler;
pub mod task_initializer;

pub use escalation_engine::{EscalationEngine, SweepError, SweepReport};
pub use escalation_policy::{EscalationPolicy, PolicyDecision};
pub use notification_emitter::{EmissionKind, NotificationEmitter};
pub use scheduler::EscalationScheduler;
pub use task_initializer::{NewInstanceRequest, TaskInitializer};
