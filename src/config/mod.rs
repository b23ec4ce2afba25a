//! # Escalation Engine Configuration
//!
//! Settings are layered with the `config` crate: built-in defaults, then an optional
//! file (`config/escalation.{toml,yaml,json}` or an explicit path), then environment
//! variables prefixed with `ESCALATION_`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use workflow_escalation::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let interval = manager.config().sweep_interval();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration for the escalation engine and its driver
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EscalationConfig {
    /// Seconds between driver ticks
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,

    /// Upper bound on instances evaluated concurrently within one sweep
    #[serde(default = "default_max_concurrent_instances")]
    pub max_concurrent_instances: usize,

    /// Width of the reminder window starting at the scheduled time
    #[serde(default = "default_window_minutes")]
    pub reminder_window_minutes: i64,

    /// Width of the escalation and warning windows
    #[serde(default = "default_window_minutes")]
    pub firing_window_minutes: i64,

    /// Buffer size of the notification broadcast channel
    #[serde(default = "default_notification_channel_capacity")]
    pub notification_channel_capacity: usize,
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

fn default_max_concurrent_instances() -> usize {
    8
}

fn default_window_minutes() -> i64 {
    1
}

fn default_notification_channel_capacity() -> usize {
    1000
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: default_sweep_interval_seconds(),
            max_concurrent_instances: default_max_concurrent_instances(),
            reminder_window_minutes: default_window_minutes(),
            firing_window_minutes: default_window_minutes(),
            notification_channel_capacity: default_notification_channel_capacity(),
        }
    }
}

impl EscalationConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.sweep_interval_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "sweep_interval_seconds",
                self.sweep_interval_seconds,
                "must be greater than zero",
            ));
        }
        if self.max_concurrent_instances == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_concurrent_instances",
                self.max_concurrent_instances,
                "must be greater than zero",
            ));
        }
        if self.reminder_window_minutes < 1 {
            return Err(ConfigurationError::invalid_value(
                "reminder_window_minutes",
                self.reminder_window_minutes,
                "must be at least one minute",
            ));
        }
        if self.firing_window_minutes < 1 {
            return Err(ConfigurationError::invalid_value(
                "firing_window_minutes",
                self.firing_window_minutes,
                "must be at least one minute",
            ));
        }
        if self.notification_channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "notification_channel_capacity",
                self.notification_channel_capacity,
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let config = EscalationConfig::default();
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.reminder_window_minutes, 1);
        assert_eq!(config.firing_window_minutes, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let config = EscalationConfig {
            sweep_interval_seconds: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { .. })
        ));

        let config = EscalationConfig {
            firing_window_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
