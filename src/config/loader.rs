//! Configuration Loader
//!
//! Environment-aware configuration loading. Handles file discovery, environment
//! detection and layering of defaults, file values and environment overrides.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::ConfigResult;
use super::EscalationConfig;

const ENV_PREFIX: &str = "ESCALATION";
const DEFAULT_CONFIG_BASENAME: &str = "config/escalation";

/// Loaded configuration together with the environment it was resolved for
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: EscalationConfig,
    environment: String,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_path(None)
    }

    /// Load configuration from an explicit file, or the default location when `None`
    pub fn load_from_path(path: Option<&Path>) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_overrides(path, None)
    }

    /// Load configuration with an explicit set of environment overrides.
    ///
    /// When `env_overrides` is `Some`, the process environment is not consulted; this
    /// keeps tests independent of shared environment variables.
    pub fn load_with_overrides(
        path: Option<&Path>,
        env_overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();

        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&EscalationConfig::default())?);

        builder = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading escalation configuration file");
                builder.add_source(config::File::from(path.to_path_buf()))
            }
            None => builder
                .add_source(config::File::with_name(DEFAULT_CONFIG_BASENAME).required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true)
                .source(env_overrides),
        );

        let config: EscalationConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %environment,
            sweep_interval_seconds = config.sweep_interval_seconds,
            max_concurrent_instances = config.max_concurrent_instances,
            reminder_window_minutes = config.reminder_window_minutes,
            firing_window_minutes = config.firing_window_minutes,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
        }))
    }

    /// Wrap an already-built configuration
    pub fn from_config(config: EscalationConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: Self::detect_environment(),
        }))
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Detect the deployment environment from well-known variables
    pub fn detect_environment() -> String {
        env::var("ESCALATION_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    /// Default config file base path, relative to the working directory
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_BASENAME)
    }
}
