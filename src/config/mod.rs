//! Configuration loading and parsing.
//!
//! YAML-based configuration for the scheduler, the payment client, and the
//! API server, plus seed-record loading for local runs.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::core::due::{DEFAULT_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES};
use crate::core::retry::RetryPolicy;
use crate::core::transaction::RecurringTransaction;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML.
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between scheduler ticks.
    pub tick_interval_secs: u64,
    /// Interval substituted for records without one, in minutes.
    pub default_interval_minutes: i64,
    /// Retry behavior for failed submissions.
    pub retry: RetryConfig,
    /// Outbound payment service.
    pub payment: PaymentConfig,
    /// API server binding.
    pub api: ApiServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_secs: 15,
            default_interval_minutes: DEFAULT_INTERVAL_MINUTES,
            retry: RetryConfig::default(),
            payment: PaymentConfig::default(),
            api: ApiServerConfig::default(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of failed attempts tolerated before cancellation.
    pub max_attempts: u32,
    /// Wait between a failure and the next retry, in seconds.
    pub wait_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait_secs: 60,
        }
    }
}

impl RetryConfig {
    /// Convert into the scheduler's retry policy.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.wait_secs))
    }
}

/// Payment service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Base URL of the transaction service.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            timeout_secs: 10,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8580,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "tick_interval_secs must be positive".to_string(),
            ));
        }
        if self.default_interval_minutes <= 0 {
            return Err(ConfigError::InvalidConfig(
                "default_interval_minutes must be positive".to_string(),
            ));
        }
        if self.default_interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(ConfigError::InvalidConfig(format!(
                "default_interval_minutes must not exceed {}",
                MAX_INTERVAL_MINUTES
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "retry.max_attempts must be positive".to_string(),
            ));
        }
        if self.payment.base_url.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "payment.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Tick interval as a duration.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

/// Load seed records from a YAML file.
///
/// The file holds a list of `RecurringTransaction` values and is meant
/// for local runs against the in-memory store.
pub fn load_seed_records(path: impl AsRef<Path>) -> Result<Vec<RecurringTransaction>, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let records: Vec<RecurringTransaction> = serde_yaml::from_str(&contents)?;
    Ok(records)
}
