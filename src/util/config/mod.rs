//! taskloom configuration
//!
//! Runtime settings loaded from a TOML file, with an environment override for
//! the log level.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. Environment variables (TASKLOOM_LOG)
//! 2. Config file (taskloom.toml)
//! 3. Default values
//! ```
//!
//! # Example
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [scheduler]
//! stack_size = 1048576
//!
//! [events]
//! dispatch_thread = "event-dispatch"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::runtime::event::EventConfig;
use crate::runtime::scheduler::SchedulerConfig;
use crate::util::logger::LogLevel;

/// Environment variable overriding `[log] level`.
pub const LOG_ENV: &str = "TASKLOOM_LOG";

/// Top-level runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
    /// Worker thread settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Event bus settings
    #[serde(default)]
    pub events: EventConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level written by the default subscriber
    #[serde(default)]
    pub level: LogLevel,
}

impl RuntimeConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a TOML file and apply environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise; environment overrides
    /// apply in both cases.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load_from_path(path);
        }
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Apply `TASKLOOM_LOG` if set to a known level.
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(LOG_ENV) {
            self.apply_log_override(&value);
        }
    }

    fn apply_log_override(
        &mut self,
        value: &str,
    ) {
        match LogLevel::parse(value) {
            Some(level) => self.log.level = level,
            None => tracing::warn!("ignoring unknown {} value '{}'", LOG_ENV, value),
        }
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
