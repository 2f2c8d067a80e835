//! Runtime configuration for devstack
//!
//! All knobs load from environment variables with defaults, so the CLI works
//! with zero setup:
//!
//! - `DEVSTACK_HEALTH_ATTEMPTS`: health-poll attempts per service - default: "30"
//! - `DEVSTACK_HEALTH_INTERVAL_MS`: delay between attempts - default: "1000"
//! - `DEVSTACK_MAX_IMPORT_DEPTH`: import-graph recursion bound - default: "10"
//! - `DEVSTACK_LOG_LEVEL`: logging level - default: "info" (read in main)

use crate::discovery::MAX_IMPORT_DEPTH;
use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HEALTH_ATTEMPTS: u32 = 30;
const DEFAULT_HEALTH_INTERVAL_MS: u64 = 1000;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct DevstackConfig {
    /// Health-check attempts before a service is declared unreachable
    pub health_attempts: u32,
    /// Fixed delay between health-check attempts
    pub health_interval: Duration,
    /// Recursion bound for the import-graph scan
    pub max_import_depth: usize,
}

impl Default for DevstackConfig {
    fn default() -> Self {
        Self {
            health_attempts: DEFAULT_HEALTH_ATTEMPTS,
            health_interval: Duration::from_millis(DEFAULT_HEALTH_INTERVAL_MS),
            max_import_depth: MAX_IMPORT_DEPTH,
        }
    }
}

impl DevstackConfig {
    /// Loads configuration from the environment, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(attempts) = parse_env("DEVSTACK_HEALTH_ATTEMPTS")? {
            config.health_attempts = attempts;
        }
        if let Some(interval_ms) = parse_env::<u64>("DEVSTACK_HEALTH_INTERVAL_MS")? {
            config.health_interval = Duration::from_millis(interval_ms);
        }
        if let Some(depth) = parse_env("DEVSTACK_MAX_IMPORT_DEPTH")? {
            config.max_import_depth = depth;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.health_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                var: "DEVSTACK_HEALTH_ATTEMPTS",
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|err: T::Err| ConfigError::InvalidValue {
                var,
                value: raw.clone(),
                reason: err.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
