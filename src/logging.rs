//! # Structured Logging Module
//!
//! Environment-aware structured logging for the escalation engine. Console output is
//! human readable in development and JSON in production, so sweep summaries and task
//! transitions can be shipped to a log pipeline unchanged.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::models::Role;
use crate::state_machine::TaskState;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call more than once; only the first call installs a subscriber, and an
/// already-installed global subscriber is left in place.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let layer = if use_json_output(&environment) {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("ESCALATION_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

fn use_json_output(environment: &str) -> bool {
    environment == "production"
}

/// Log structured data for a task transition
pub fn log_task_transition(
    instance_id: Uuid,
    task_id: Uuid,
    event: &str,
    from: TaskState,
    to: TaskState,
    assigned_to: Role,
) {
    tracing::info!(
        instance_id = %instance_id,
        task_id = %task_id,
        event = %event,
        from = %from,
        to = %to,
        assigned_to = %assigned_to,
        "📋 TASK_TRANSITION"
    );
}

/// Log the outcome of one sweep
pub fn log_sweep_summary(
    instances_evaluated: usize,
    tasks_transitioned: usize,
    notifications_emitted: usize,
    error_count: usize,
    duration_ms: u128,
) {
    if error_count > 0 {
        tracing::warn!(
            instances_evaluated,
            tasks_transitioned,
            notifications_emitted,
            error_count,
            duration_ms = duration_ms as u64,
            "⚠️ SWEEP completed with errors"
        );
    } else {
        tracing::info!(
            instances_evaluated,
            tasks_transitioned,
            notifications_emitted,
            duration_ms = duration_ms as u64,
            "✅ SWEEP completed"
        );
    }
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        "❌ ERROR"
    );
}
