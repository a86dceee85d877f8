//! Prelude module for common re-exports.
//!
//! ```rust
//! use mecha_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{
    DEFAULT_CYCLE_TIME_MS, MAX_EDGE_LISTENERS, SM_STATE_DISABLED, SM_STATE_STARTED,
};

// ─── Hardware Capabilities ──────────────────────────────────────────
pub use crate::hal::{DigitalSource, Gyro, MotorOutput, StickAxis, StickInput, WheelEncoder};

// ─── Robot ──────────────────────────────────────────────────────────
pub use crate::robot::state::{ChassisKind, RobotMode, Wheel};

/// Default scheduler period as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_millis(DEFAULT_CYCLE_TIME_MS);
