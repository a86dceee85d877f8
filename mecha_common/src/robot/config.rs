//! Robot configuration structures.
//!
//! All config types use `serde::Deserialize` for TOML loading.
//! Every field has a default matching the reference practice robot, so an
//! empty `[drive]` table yields a working mecanum configuration.
//! Polarity facts (encoder sign, motor inversion, arcade rotation sign) are
//! hardware calibration and therefore live here, never in the control code.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    CYCLE_TIME_MS_MAX, CYCLE_TIME_MS_MIN, DEFAULT_CYCLE_TIME_MS, MAX_DIGITAL_WIDTH, WHEEL_COUNT,
};
use crate::robot::state::ChassisKind;

/// Longest accepted settling duration [ms].
pub const SETTLING_MS_MAX: u64 = 10_000;

/// Default drive (X/Y) gains and tolerances [inches].
pub const DRIVE_KP: f64 = 0.35;
pub const DRIVE_TOLERANCE: f64 = 0.5;
pub const DRIVE_SETTLING_MS: u64 = 200;

/// Default heading gains and tolerances [degrees].
pub const TURN_KP: f64 = 0.11;
pub const TURN_KD: f64 = 1.04;
pub const TURN_TOLERANCE: f64 = 0.005;
pub const TURN_SETTLING_MS: u64 = 200;

/// Default line-position gains. Positions run from -2 (line far right) to
/// 2 (line far left).
pub const LINE_KP: f64 = 0.15;
pub const LINE_SETTLING_MS: u64 = 200;

/// Digital inputs wired to the left, center and right light sensors.
pub const LIGHT_SENSOR_CHANNELS: [u32; 3] = [12, 13, 14];

/// Powers used while the line is out of sight.
pub const FIND_LINE_DRIVE: f64 = 0.3;
pub const FIND_LINE_TURN: f64 = 0.2;

/// Wheel circumference for a 6 inch wheel, encoders reporting revolutions.
pub const DISTANCE_PER_REV: f64 = 6.0 * std::f64::consts::PI;

/// Joystick deadband threshold.
pub const DEADBAND_THRESHOLD: f64 = 0.15;

/// Driver stick scaling.
pub const DRIVE_SCALE_FACTOR: f64 = 0.5;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete robot configuration.
///
/// # TOML Example
///
/// ```toml
/// cycle_time_ms = 100
///
/// [shared]
/// robot_name = "practice-bot"
///
/// [drive]
/// chassis = "mecanum"
///
/// [drive.turn_pid]
/// kp = 0.11
/// kd = 1.04
/// tolerance = 0.005
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    /// Scheduler period [ms] (default: 100).
    #[serde(default = "default_cycle_time_ms")]
    pub cycle_time_ms: u64,

    #[serde(default)]
    pub drive: DriveConfig,

    #[serde(default)]
    pub teleop: TeleopConfig,
}

fn default_cycle_time_ms() -> u64 {
    DEFAULT_CYCLE_TIME_MS
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            cycle_time_ms: DEFAULT_CYCLE_TIME_MS,
            drive: DriveConfig::default(),
            teleop: TeleopConfig::default(),
        }
    }
}

impl RobotConfig {
    /// Validate all sections, reporting the first failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.cycle_time_ms < CYCLE_TIME_MS_MIN || self.cycle_time_ms > CYCLE_TIME_MS_MAX {
            return Err(ConfigError::ValidationError(format!(
                "cycle_time_ms {} out of range [{}, {}]",
                self.cycle_time_ms, CYCLE_TIME_MS_MIN, CYCLE_TIME_MS_MAX
            )));
        }
        self.drive
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("drive: {e}")))?;
        self.teleop
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("teleop: {e}")))?;
        Ok(())
    }
}

// ─── PID Config ─────────────────────────────────────────────────────

/// Tuning for one PID axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    #[serde(default)]
    pub kp: f64,
    #[serde(default)]
    pub ki: f64,
    #[serde(default)]
    pub kd: f64,

    /// Error band counted as on target.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Time the error must stay inside `tolerance` [ms].
    #[serde(default = "default_settling_ms")]
    pub settling_ms: u64,

    #[serde(default = "default_min_output")]
    pub min_output: f64,
    #[serde(default = "default_max_output")]
    pub max_output: f64,

    /// Compute error as `input - target`.
    #[serde(default)]
    pub inverted: bool,

    /// Treat targets as absolute setpoints instead of offsets from the
    /// current reading.
    #[serde(default)]
    pub absolute_setpoint: bool,
}

fn default_tolerance() -> f64 {
    DRIVE_TOLERANCE
}
fn default_settling_ms() -> u64 {
    DRIVE_SETTLING_MS
}
fn default_min_output() -> f64 {
    -1.0
}
fn default_max_output() -> f64 {
    1.0
}

impl PidConfig {
    /// Translation axis defaults.
    pub const fn drive() -> Self {
        Self {
            kp: DRIVE_KP,
            ki: 0.0,
            kd: 0.0,
            tolerance: DRIVE_TOLERANCE,
            settling_ms: DRIVE_SETTLING_MS,
            min_output: -1.0,
            max_output: 1.0,
            inverted: false,
            absolute_setpoint: false,
        }
    }

    /// Line-position defaults. Targets are absolute positions.
    pub const fn line() -> Self {
        Self {
            kp: LINE_KP,
            ki: 0.0,
            kd: 0.0,
            tolerance: 0.0,
            settling_ms: LINE_SETTLING_MS,
            min_output: -1.0,
            max_output: 1.0,
            inverted: false,
            absolute_setpoint: true,
        }
    }

    /// Heading axis defaults.
    pub const fn turn() -> Self {
        Self {
            kp: TURN_KP,
            ki: 0.0,
            kd: TURN_KD,
            tolerance: TURN_TOLERANCE,
            settling_ms: TURN_SETTLING_MS,
            min_output: -1.0,
            max_output: 1.0,
            inverted: false,
            absolute_setpoint: false,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, gain) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(format!("{name} {gain} must be finite and >= 0"));
            }
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(format!("tolerance {} must be finite and >= 0", self.tolerance));
        }
        if self.settling_ms > SETTLING_MS_MAX {
            return Err(format!(
                "settling_ms {} exceeds {}",
                self.settling_ms, SETTLING_MS_MAX
            ));
        }
        if !(self.min_output < self.max_output) {
            return Err(format!(
                "output range [{}, {}] is empty",
                self.min_output, self.max_output
            ));
        }
        if self.min_output < -1.0 || self.max_output > 1.0 {
            return Err(format!(
                "output range [{}, {}] exceeds [-1, 1]",
                self.min_output, self.max_output
            ));
        }
        Ok(())
    }
}

// ─── Drive Config ───────────────────────────────────────────────────

/// Drivetrain geometry, polarity and PID tuning.
///
/// Per-wheel arrays are ordered LF, LR, RF, RR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveConfig {
    #[serde(default)]
    pub chassis: ChassisKind,

    /// Lateral axis tuning; only used on a holonomic chassis.
    #[serde(default = "default_x_pid")]
    pub x_pid: Option<PidConfig>,

    #[serde(default = "PidConfig::drive")]
    pub y_pid: PidConfig,

    #[serde(default = "PidConfig::turn")]
    pub turn_pid: PidConfig,

    /// Sign applied to each encoder reading.
    #[serde(default = "default_wheel_polarity")]
    pub wheel_polarity: [f64; WHEEL_COUNT],

    /// Distance travelled per encoder unit.
    #[serde(default = "default_distance_per_unit")]
    pub distance_per_unit: f64,

    /// Motors whose output sign is flipped before writing.
    #[serde(default = "default_motor_inverted")]
    pub motor_inverted: [bool; WHEEL_COUNT],

    /// Flip the rotation sign in arcade mixing.
    #[serde(default = "default_true")]
    pub arcade_rotation_inverted: bool,

    /// Square arcade/tank inputs (sign preserved) for finer low-speed control.
    #[serde(default = "default_true")]
    pub squared_inputs: bool,

    /// Light-sensor line follower; absent means not fitted.
    #[serde(default)]
    pub line_follower: Option<LineFollowerConfig>,
}

fn default_x_pid() -> Option<PidConfig> {
    Some(PidConfig::drive())
}
fn default_wheel_polarity() -> [f64; WHEEL_COUNT] {
    [1.0, 1.0, -1.0, -1.0]
}
fn default_distance_per_unit() -> f64 {
    DISTANCE_PER_REV
}
fn default_motor_inverted() -> [bool; WHEEL_COUNT] {
    [false, false, true, true]
}
fn default_true() -> bool {
    true
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            chassis: ChassisKind::default(),
            x_pid: default_x_pid(),
            y_pid: PidConfig::drive(),
            turn_pid: PidConfig::turn(),
            wheel_polarity: default_wheel_polarity(),
            distance_per_unit: DISTANCE_PER_REV,
            motor_inverted: default_motor_inverted(),
            arcade_rotation_inverted: true,
            squared_inputs: true,
            line_follower: None,
        }
    }
}

impl DriveConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.chassis.is_holonomic() && self.x_pid.is_none() {
            return Err("mecanum chassis requires x_pid".to_string());
        }
        if let Some(x) = &self.x_pid {
            x.validate().map_err(|e| format!("x_pid: {e}"))?;
        }
        self.y_pid.validate().map_err(|e| format!("y_pid: {e}"))?;
        self.turn_pid
            .validate()
            .map_err(|e| format!("turn_pid: {e}"))?;
        if let Some(p) = self.wheel_polarity.iter().find(|p| p.abs() != 1.0) {
            return Err(format!("wheel_polarity entries must be +1 or -1, got {p}"));
        }
        if !self.distance_per_unit.is_finite() || self.distance_per_unit <= 0.0 {
            return Err(format!(
                "distance_per_unit {} must be > 0",
                self.distance_per_unit
            ));
        }
        if let Some(line) = &self.line_follower {
            line.validate().map_err(|e| format!("line_follower: {e}"))?;
        }
        Ok(())
    }
}

// ─── Line Follower Config ───────────────────────────────────────────

/// Three downward light sensors and the controller that centers the robot
/// over the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineFollowerConfig {
    /// 1-based digital input channels, ordered left, center, right.
    #[serde(default = "default_light_channels")]
    pub channels: [u32; 3],

    #[serde(default = "PidConfig::line")]
    pub light_pid: PidConfig,

    /// Forward power while searching for a lost line.
    #[serde(default = "default_find_drive_power")]
    pub find_drive_power: f64,

    /// Turn power while searching for a lost line.
    #[serde(default = "default_find_turn_power")]
    pub find_turn_power: f64,
}

fn default_light_channels() -> [u32; 3] {
    LIGHT_SENSOR_CHANNELS
}
fn default_find_drive_power() -> f64 {
    FIND_LINE_DRIVE
}
fn default_find_turn_power() -> f64 {
    FIND_LINE_TURN
}

impl Default for LineFollowerConfig {
    fn default() -> Self {
        Self {
            channels: LIGHT_SENSOR_CHANNELS,
            light_pid: PidConfig::line(),
            find_drive_power: FIND_LINE_DRIVE,
            find_turn_power: FIND_LINE_TURN,
        }
    }
}

impl LineFollowerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ch) = self
            .channels
            .iter()
            .find(|ch| !(1..=MAX_DIGITAL_WIDTH).contains(*ch))
        {
            return Err(format!("channel {ch} out of range [1, {MAX_DIGITAL_WIDTH}]"));
        }
        let [l, c, r] = self.channels;
        if l == c || c == r || l == r {
            return Err(format!("channels {:?} must be distinct", self.channels));
        }
        self.light_pid
            .validate()
            .map_err(|e| format!("light_pid: {e}"))?;
        for (name, power) in [
            ("find_drive_power", self.find_drive_power),
            ("find_turn_power", self.find_turn_power),
        ] {
            if !(0.0..=1.0).contains(&power) {
                return Err(format!("{name} {power} out of range [0, 1]"));
            }
        }
        Ok(())
    }
}

// ─── Teleop Config ──────────────────────────────────────────────────

/// How the driver stick maps onto translation and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StickLayout {
    /// One stick drives each side; crab only when both X agree in sign.
    Tank,
    /// Y forward, X rotation, Z crab.
    #[default]
    Arcade,
}

/// Driver control tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeleopConfig {
    #[serde(default)]
    pub layout: StickLayout,

    #[serde(default = "default_deadband")]
    pub deadband: f64,

    #[serde(default = "default_drive_scale")]
    pub drive_scale: f64,

    /// Button mask that toggles mecanum mixing.
    #[serde(default = "default_mecanum_toggle_button")]
    pub mecanum_toggle_button: u32,
}

fn default_deadband() -> f64 {
    DEADBAND_THRESHOLD
}
fn default_drive_scale() -> f64 {
    DRIVE_SCALE_FACTOR
}
fn default_mecanum_toggle_button() -> u32 {
    0x0001
}

impl Default for TeleopConfig {
    fn default() -> Self {
        Self {
            layout: StickLayout::default(),
            deadband: DEADBAND_THRESHOLD,
            drive_scale: DRIVE_SCALE_FACTOR,
            mecanum_toggle_button: default_mecanum_toggle_button(),
        }
    }
}

impl TeleopConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.deadband) {
            return Err(format!("deadband {} out of range [0, 1)", self.deadband));
        }
        if !(self.drive_scale > 0.0 && self.drive_scale <= 1.0) {
            return Err(format!("drive_scale {} out of range (0, 1]", self.drive_scale));
        }
        if self.mecanum_toggle_button.count_ones() != 1 {
            return Err(format!(
                "mecanum_toggle_button {:#x} must select exactly one button",
                self.mecanum_toggle_button
            ));
        }
        Ok(())
    }
}
