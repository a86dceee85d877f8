//! Configuration loading traits and types.
//!
//! Every mecha binary loads its TOML configuration through [`ConfigLoader`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use mecha_common::config::{ConfigLoader, SharedConfig, ConfigError};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct BenchConfig {
//!     shared: SharedConfig,
//!     cycles: u32,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = BenchConfig::load(Path::new("bench.toml"))?;
//!     println!("Robot: {}", config.shared.robot_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// File could not be read or TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared by every robot configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// robot_name = "practice-bot"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Robot instance identifier, used in log spans.
    pub robot_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            robot_name: "mecha".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `robot_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.robot_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "robot_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// The default implementation works with any type implementing
/// `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if the file is unreadable or the TOML is invalid
pub trait ConfigLoader: Sized {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError>
    where
        Self: serde::de::DeserializeOwned,
    {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    fn from_toml_str(content: &str) -> Result<Self, ConfigError>
    where
        Self: serde::de::DeserializeOwned,
    {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
