//! System-wide constants for the mecha workspace.
//!
//! Single source of truth for numeric limits and default paths.

use static_assertions::const_assert;

/// Default scheduler period in milliseconds.
pub const DEFAULT_CYCLE_TIME_MS: u64 = 100;

/// Shortest accepted scheduler period [ms].
pub const CYCLE_TIME_MS_MIN: u64 = 5;

/// Longest accepted scheduler period [ms].
pub const CYCLE_TIME_MS_MAX: u64 = 1000;

/// Maximum number of listener registrations per edge dispatcher.
pub const MAX_EDGE_LISTENERS: usize = 16;

/// Maximum number of tasks hosted by one scheduler.
pub const MAX_TASKS: usize = 32;

/// Widest digital word an edge dispatcher can sample.
pub const MAX_DIGITAL_WIDTH: u32 = 32;

/// State-machine id meaning "not running".
pub const SM_STATE_DISABLED: u32 = 0;

/// First state of every sequence after `start()`.
pub const SM_STATE_STARTED: u32 = 1;

/// Number of drive wheels on the chassis (LF, LR, RF, RR).
pub const WHEEL_COUNT: usize = 4;

/// Default robot configuration path.
pub const DEFAULT_CONFIG_PATH: &str = "config/robot.toml";

const_assert!(CYCLE_TIME_MS_MIN <= DEFAULT_CYCLE_TIME_MS);
const_assert!(DEFAULT_CYCLE_TIME_MS <= CYCLE_TIME_MS_MAX);
const_assert!(SM_STATE_STARTED > SM_STATE_DISABLED);
const_assert!(MAX_EDGE_LISTENERS > 0);
