//! Robot configuration loading: parse TOML, then validate bounds and
//! cross-field rules before anything is built from it.

use std::path::Path;

use mecha_common::config::{ConfigError, ConfigLoader};
use mecha_common::robot::config::RobotConfig;
use tracing::info;

/// Load and validate a robot configuration file.
pub fn load_robot_config(path: &Path) -> Result<RobotConfig, ConfigError> {
    let config = RobotConfig::load(path)?;
    config.validate()?;
    info!(
        path = %path.display(),
        robot = %config.shared.robot_name,
        chassis = ?config.drive.chassis,
        cycle_time_ms = config.cycle_time_ms,
        "robot configuration loaded"
    );
    Ok(config)
}

/// Parse and validate a robot configuration from TOML text.
pub fn robot_config_from_str(content: &str) -> Result<RobotConfig, ConfigError> {
    let config = RobotConfig::from_toml_str(content)?;
    config.validate()?;
    Ok(config)
}
