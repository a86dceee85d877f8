//! Drive base: the chassis plus the PID drive that moves it.
//!
//! Exposes narrow capabilities rather than one wide interface: [`Task`] for
//! the scheduler, [`PidInputSource`] for anything that needs odometry,
//! [`ConfigurableParams`] for gain tuning, and
//! [`DriveCommands`](super::autonomous::DriveCommands) for routines.

use mecha_common::robot::config::DriveConfig;
use mecha_common::robot::state::{ChassisKind, RobotMode};
use tracing::{debug, info};

use super::autonomous::DriveCommands;
use super::chassis::{Chassis, ChassisHardware};
use crate::control::drive::{DriveTarget, LineTarget, PidDrive};
use crate::control::kinematics::{DriveOutput, PidAxis, PidInputSource, Pose};
use crate::control::pid::{PidController, PidGains};
use crate::error::ParamError;
use crate::event::SharedClock;
use crate::input::line::LinePattern;
use crate::params::{ConfigurableParams, ParamDescriptor, ParamValue, check_gain};
use crate::task::{Task, TaskPhases};

static DRIVE_PARAMS: [ParamDescriptor; 8] = [
    ParamDescriptor::read_only("DrivePID", "Get Drive PID constants"),
    ParamDescriptor::writable("DriveKp", "Get/Set Drive Kp constant"),
    ParamDescriptor::writable("DriveKi", "Get/Set Drive Ki constant"),
    ParamDescriptor::writable("DriveKd", "Get/Set Drive Kd constant"),
    ParamDescriptor::read_only("TurnPID", "Get Turn PID constants"),
    ParamDescriptor::writable("TurnKp", "Get/Set Turn Kp constant"),
    ParamDescriptor::writable("TurnKi", "Get/Set Turn Ki constant"),
    ParamDescriptor::writable("TurnKd", "Get/Set Turn Kd constant"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term {
    Kp,
    Ki,
    Kd,
}

impl Term {
    fn get(self, gains: PidGains) -> f64 {
        match self {
            Self::Kp => gains.kp,
            Self::Ki => gains.ki,
            Self::Kd => gains.kd,
        }
    }

    fn set(self, gains: &mut PidGains, value: f64) {
        match self {
            Self::Kp => gains.kp = value,
            Self::Ki => gains.ki = value,
            Self::Kd => gains.kd = value,
        }
    }
}

/// Which controller group a parameter name addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Drive,
    Turn,
}

fn parse_param(name: &str) -> Option<(Group, Option<Term>)> {
    let (group, rest) = if let Some(rest) = name.strip_prefix("Drive") {
        (Group::Drive, rest)
    } else if let Some(rest) = name.strip_prefix("Turn") {
        (Group::Turn, rest)
    } else {
        return None;
    };
    let term = match rest {
        "PID" => None,
        "Kp" => Some(Term::Kp),
        "Ki" => Some(Term::Ki),
        "Kd" => Some(Term::Kd),
        _ => return None,
    };
    Some((group, term))
}

fn apply_term(pid: &mut PidController, term: Term, value: f64) {
    let mut gains = pid.gains();
    term.set(&mut gains, value);
    pid.set_gains(gains);
}

pub struct DriveBase {
    chassis: Chassis,
    drive: PidDrive,
}

impl DriveBase {
    pub const PHASES: TaskPhases = TaskPhases::from_bits_truncate(
        TaskPhases::START_MODE.bits()
            | TaskPhases::STOP_MODE.bits()
            | TaskPhases::POST_PERIODIC.bits(),
    );

    pub fn new(hardware: ChassisHardware, config: &DriveConfig, clock: SharedClock) -> Self {
        let x = match config.chassis {
            ChassisKind::Mecanum => config
                .x_pid
                .as_ref()
                .map(|c| PidController::new("x", c, clock.clone())),
            ChassisKind::Tank => None,
        };
        let y = PidController::new("y", &config.y_pid, clock.clone());
        let turn = PidController::new("turn", &config.turn_pid, clock.clone());
        let chassis = Chassis::new(hardware, config);
        let mut drive = PidDrive::new("drive", config.chassis, x, y, turn, clock.clone());
        if let Some(line) = config
            .line_follower
            .as_ref()
            .filter(|_| chassis.sensors().has_line_sensor())
        {
            let light = PidController::new("light", &line.light_pid, clock);
            drive = drive.with_line_follower(light, line.find_drive_power, line.find_turn_power);
        }
        info!(
            chassis = ?config.chassis,
            line_follower = drive.light_pid().is_some(),
            "drive base ready"
        );
        Self { chassis, drive }
    }

    pub fn chassis(&self) -> &Chassis {
        &self.chassis
    }

    pub fn pid_drive(&self) -> &PidDrive {
        &self.drive
    }

    pub fn pose(&self) -> Pose {
        self.chassis.sensors().pose()
    }

    pub fn reset_position(&mut self) {
        self.chassis.sensors_mut().reset_position();
        debug!("drive base position reset");
    }

    /// Start a PID move relative to the current pose.
    pub fn set_target(&mut self, target: DriveTarget) {
        self.drive.set_target(self.chassis.sensors(), target);
    }

    /// Hold a heading while translating at constant power (mecanum only).
    pub fn set_angle_target(&mut self, x_power: f64, y_power: f64, angle: f64) -> bool {
        self.drive
            .set_angle_target(self.chassis.sensors(), x_power, y_power, angle)
    }

    /// Follow the line under the light array. Returns `false` when no line
    /// follower is fitted.
    pub fn follow_line(&mut self, target: LineTarget) -> bool {
        self.chassis.sensors_mut().sample_line();
        self.drive.follow_line(self.chassis.sensors(), target)
    }

    pub fn stop(&mut self) {
        self.drive.stop(self.chassis.motors_mut());
    }

    /// One PID drive step.
    pub fn update(&mut self) {
        self.chassis.sensors_mut().sample_line();
        let (sensors, motors) = self.chassis.split();
        self.drive.update(sensors, motors);
    }

    // Manual driving. These bypass the PID drive and are ignored while it
    // is running a move.

    pub fn arcade_drive(&mut self, forward: f64, rotation: f64) {
        if !self.drive.is_active() {
            self.chassis.motors_mut().arcade(forward, rotation);
        }
    }

    pub fn tank_drive(&mut self, left: f64, right: f64) {
        if !self.drive.is_active() {
            self.chassis.motors_mut().tank(left, right);
        }
    }

    pub fn mecanum_drive_polar(&mut self, magnitude: f64, direction_deg: f64, rotation: f64) {
        if !self.drive.is_active() {
            self.chassis
                .motors_mut()
                .mecanum_polar(magnitude, direction_deg, rotation);
        }
    }

    fn group_pid(&self, group: Group) -> &PidController {
        match group {
            Group::Drive => self.drive.y_pid(),
            Group::Turn => self.drive.turn_pid(),
        }
    }
}

impl Task for DriveBase {
    fn start_mode(&mut self, mode: RobotMode) {
        if mode != RobotMode::Disabled {
            self.reset_position();
        }
    }

    fn stop_mode(&mut self, _mode: RobotMode) {
        self.stop();
    }

    fn post_periodic(&mut self, _mode: RobotMode) {
        self.update();
    }
}

impl PidInputSource for DriveBase {
    fn pid_input(&self, axis: PidAxis) -> f64 {
        self.chassis.sensors().pid_input(axis)
    }

    fn line_pattern(&self) -> Option<LinePattern> {
        self.chassis.sensors().line_pattern()
    }
}

impl DriveCommands for DriveBase {
    fn drive_set_target(&mut self, target: DriveTarget) {
        self.set_target(target);
    }

    fn drive_stop(&mut self) {
        self.stop();
    }
}

impl ConfigurableParams for DriveBase {
    fn param_descriptors(&self) -> &'static [ParamDescriptor] {
        &DRIVE_PARAMS
    }

    fn get_param(&self, name: &str) -> Result<ParamValue, ParamError> {
        let (group, term) =
            parse_param(name).ok_or_else(|| ParamError::UnknownParam(name.to_owned()))?;
        let gains = self.group_pid(group).gains();
        Ok(match term {
            Some(term) => ParamValue::Scalar(term.get(gains)),
            None => ParamValue::Gains(gains),
        })
    }

    /// Drive gains apply to both translation controllers.
    fn set_param(&mut self, name: &str, value: f64) -> Result<(), ParamError> {
        let descriptor = self.find_param(name)?;
        if !descriptor.writable {
            return Err(ParamError::ReadOnly(name.to_owned()));
        }
        let value = check_gain(name, value)?;
        let Some((group, Some(term))) = parse_param(name) else {
            return Err(ParamError::UnknownParam(name.to_owned()));
        };
        match group {
            Group::Drive => {
                apply_term(self.drive.y_pid_mut(), term, value);
                if let Some(x) = self.drive.x_pid_mut() {
                    apply_term(x, term, value);
                }
            }
            Group::Turn => apply_term(self.drive.turn_pid_mut(), term, value),
        }
        info!(param = name, value, "parameter updated");
        Ok(())
    }
}
