// State machine module for the task lifecycle
//
// Tasks move through pending/in_progress/completed under user actions and through
// escalated/warning/overdue under the escalation timer.

pub mod errors;
pub mod events;
pub mod states;
pub mod task_state_machine;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::TaskEvent;
pub use states::TaskState;
pub use task_state_machine::{manual_event_for, TaskStateMachine, TransitionOutcome};
