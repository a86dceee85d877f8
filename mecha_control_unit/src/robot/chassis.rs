//! Four-wheel chassis: wheel odometry and gyro on the sensor side, mixed
//! motor writes on the actuator side.
//!
//! The two halves are separate so the PID drive can read sensors and write
//! motors in the same call.

use mecha_common::consts::WHEEL_COUNT;
use mecha_common::hal::{DigitalSource, Gyro, MotorOutput, WheelEncoder};
use mecha_common::robot::config::DriveConfig;
use tracing::{debug, trace, warn};

use crate::control::kinematics::{
    DriveOutput, PidAxis, PidInputSource, Pose, PositionEstimator, arcade_mix, limit,
    mecanum_polar_mix, sides_to_wheels, tank_mix,
};
use crate::input::line::{LinePattern, LineSensor};

/// Sync group the four drive motors are written under.
pub const DRIVE_SYNC_GROUP: u8 = 0x80;

/// Drivetrain devices, wheel arrays ordered LF, LR, RF, RR.
pub struct ChassisHardware {
    pub motors: [Box<dyn MotorOutput>; WHEEL_COUNT],
    pub encoders: [Box<dyn WheelEncoder>; WHEEL_COUNT],
    pub gyro: Box<dyn Gyro>,
    /// Digital word carrying the light sensors, when the array is fitted.
    pub line_sensors: Option<Box<dyn DigitalSource>>,
}

// ─── Sensors ────────────────────────────────────────────────────────

pub struct ChassisSensors {
    encoders: [Box<dyn WheelEncoder>; WHEEL_COUNT],
    gyro: Box<dyn Gyro>,
    estimator: PositionEstimator,
    line: Option<LineSensor>,
}

impl ChassisSensors {
    fn raw_positions(&self) -> [f64; WHEEL_COUNT] {
        std::array::from_fn(|i| self.encoders[i].position())
    }

    /// Make the current wheel positions and heading the origin.
    pub fn reset_position(&mut self) {
        let raw = self.raw_positions();
        self.estimator.reset(raw);
        self.gyro.reset();
    }

    pub fn pose(&self) -> Pose {
        self.estimator.pose(self.raw_positions())
    }

    #[inline]
    pub fn heading(&self) -> f64 {
        self.gyro.angle()
    }

    #[inline]
    pub fn has_line_sensor(&self) -> bool {
        self.line.is_some()
    }

    /// Read the light array, if fitted. Called once per tick before the
    /// drive runs.
    pub fn sample_line(&mut self) -> Option<LinePattern> {
        self.line.as_mut().map(LineSensor::sample)
    }
}

impl PidInputSource for ChassisSensors {
    fn pid_input(&self, axis: PidAxis) -> f64 {
        match axis {
            PidAxis::X => self.pose().x,
            PidAxis::Y => self.pose().y,
            PidAxis::Turn => self.heading(),
            PidAxis::Light => self.line.as_ref().map_or(0.0, LineSensor::position),
            PidAxis::Aux(_) => 0.0,
        }
    }

    fn line_pattern(&self) -> Option<LinePattern> {
        self.line.as_ref().map(LineSensor::pattern)
    }
}

// ─── Motors ─────────────────────────────────────────────────────────

pub struct ChassisMotors {
    motors: [Box<dyn MotorOutput>; WHEEL_COUNT],
    inverted: [bool; WHEEL_COUNT],
    arcade_rotation_inverted: bool,
    squared_inputs: bool,
}

impl ChassisMotors {
    /// Last value written to each motor, after inversion.
    pub fn outputs(&self) -> [f64; WHEEL_COUNT] {
        std::array::from_fn(|i| self.motors[i].output())
    }

    fn write_wheels(&mut self, wheels: [f64; WHEEL_COUNT]) {
        for (i, motor) in self.motors.iter_mut().enumerate() {
            let value = limit(wheels[i]);
            let value = if self.inverted[i] { -value } else { value };
            motor.set_output(value, DRIVE_SYNC_GROUP);
        }
        self.motors[0].apply_sync_group(DRIVE_SYNC_GROUP);
        trace!(?wheels, "wheel outputs");
    }
}

impl DriveOutput for ChassisMotors {
    fn arcade(&mut self, forward: f64, rotation: f64) {
        let rotation = if self.arcade_rotation_inverted {
            -rotation
        } else {
            rotation
        };
        let (left, right) = arcade_mix(forward, rotation, self.squared_inputs);
        self.write_wheels(sides_to_wheels(left, right));
    }

    fn tank(&mut self, left: f64, right: f64) {
        let (left, right) = tank_mix(left, right, self.squared_inputs);
        self.write_wheels(sides_to_wheels(left, right));
    }

    fn mecanum_polar(&mut self, magnitude: f64, direction_deg: f64, rotation: f64) {
        self.write_wheels(mecanum_polar_mix(magnitude, direction_deg, rotation));
    }

    fn stop_motors(&mut self) {
        self.write_wheels([0.0; WHEEL_COUNT]);
    }
}

// ─── Chassis ────────────────────────────────────────────────────────

pub struct Chassis {
    sensors: ChassisSensors,
    motors: ChassisMotors,
}

impl Chassis {
    pub fn new(hardware: ChassisHardware, config: &DriveConfig) -> Self {
        let ChassisHardware {
            motors,
            encoders,
            gyro,
            line_sensors,
        } = hardware;
        let line = match (&config.line_follower, line_sensors) {
            (Some(line), Some(source)) => Some(LineSensor::new(source, line.channels)),
            (Some(_), None) => {
                warn!("line follower configured but no light sensors fitted");
                None
            }
            (None, Some(_)) => {
                debug!("light sensors present but line follower not configured");
                None
            }
            (None, None) => None,
        };
        let mut sensors = ChassisSensors {
            encoders,
            gyro,
            estimator: PositionEstimator::new(config.wheel_polarity, config.distance_per_unit),
            line,
        };
        sensors.reset_position();
        Self {
            sensors,
            motors: ChassisMotors {
                motors,
                inverted: config.motor_inverted,
                arcade_rotation_inverted: config.arcade_rotation_inverted,
                squared_inputs: config.squared_inputs,
            },
        }
    }

    pub fn sensors(&self) -> &ChassisSensors {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut ChassisSensors {
        &mut self.sensors
    }

    pub fn motors(&self) -> &ChassisMotors {
        &self.motors
    }

    pub fn motors_mut(&mut self) -> &mut ChassisMotors {
        &mut self.motors
    }

    /// Borrow both halves at once.
    pub fn split(&mut self) -> (&ChassisSensors, &mut ChassisMotors) {
        (&self.sensors, &mut self.motors)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
