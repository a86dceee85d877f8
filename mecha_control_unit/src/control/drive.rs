//! PID drive: up to three controllers (lateral X, forward Y, heading)
//! moving a chassis to a pose relative to where the move started, or
//! holding heading while the caller supplies translation power. With a
//! light controller fitted it can also follow a line on the floor.
//!
//! The drive owns no hardware. Sensor readings and the mixed command sink
//! are passed into each call by the drivetrain that owns this drive.

use bitflags::bitflags;
use mecha_common::robot::state::ChassisKind;
use tracing::{debug, info, trace, warn};

use super::kinematics::{DriveOutput, PidAxis, PidInputSource, direction_degrees, magnitude};
use super::pid::PidController;
use crate::event::{Event, SharedClock, deadline_after, deadline_reached};
use crate::input::line::LinePattern;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct DriveFlags: u8 {
        const ACTIVE         = 0x01;
        const STOP_ON_TARGET = 0x02;
        const TURN_ONLY      = 0x04;
        const MANUAL_DRIVE   = 0x08;
        const FOLLOW_LINE    = 0x10;
    }
}

/// A relative move request.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveTarget {
    pub dx: f64,
    pub dy: f64,
    pub d_angle: f64,
    pub stop_on_target: bool,
    pub event: Option<Event>,
    /// Zero means no deadline.
    pub timeout_ms: u64,
}

impl DriveTarget {
    /// Stop-on-target move with no event and no timeout.
    pub fn new(dx: f64, dy: f64, d_angle: f64) -> Self {
        Self {
            dx,
            dy,
            d_angle,
            stop_on_target: true,
            event: None,
            timeout_ms: 0,
        }
    }

    pub fn stop_on_target(mut self, stop: bool) -> Self {
        self.stop_on_target = stop;
        self
    }

    pub fn notify(mut self, event: &Event) -> Self {
        self.event = Some(event.clone());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Pure rotation: completion ignores the translation axes.
    pub fn is_turn_only(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0 && self.d_angle != 0.0
    }
}

/// A line-following request. Runs until the array reaches a Y or T
/// junction or the timeout expires.
#[derive(Debug, Clone, PartialEq)]
pub struct LineTarget {
    /// Line position to hold, 0 = centered under the array.
    pub position: f64,
    /// Forward power while the line is in sight.
    pub drive_power: f64,
    pub event: Option<Event>,
    /// Zero means no deadline.
    pub timeout_ms: u64,
}

impl LineTarget {
    /// Follow centered at `drive_power` with no event and no timeout.
    pub fn new(drive_power: f64) -> Self {
        Self {
            position: 0.0,
            drive_power,
            event: None,
            timeout_ms: 0,
        }
    }

    pub fn position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    pub fn notify(mut self, event: &Event) -> Self {
        self.event = Some(event.clone());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Light controller and the powers used around it.
struct LineFollow {
    pid: PidController,
    drive_power: f64,
    find_drive_power: f64,
    find_turn_power: f64,
}

pub struct PidDrive {
    name: &'static str,
    chassis: ChassisKind,
    x: Option<PidController>,
    y: PidController,
    turn: PidController,
    line: Option<LineFollow>,
    flags: DriveFlags,
    event: Option<Event>,
    deadline_ms: Option<u64>,
    manual_power: (f64, f64),
    clock: SharedClock,
}

impl PidDrive {
    /// Build a drive for `chassis`. An X controller is only kept on a
    /// holonomic chassis.
    pub fn new(
        name: &'static str,
        chassis: ChassisKind,
        x: Option<PidController>,
        y: PidController,
        turn: PidController,
        clock: SharedClock,
    ) -> Self {
        let x = if chassis.is_holonomic() {
            x
        } else {
            if x.is_some() {
                warn!(drive = name, "X controller ignored on non-holonomic chassis");
            }
            None
        };
        Self {
            name,
            chassis,
            x,
            y,
            turn,
            line: None,
            flags: DriveFlags::empty(),
            event: None,
            deadline_ms: None,
            manual_power: (0.0, 0.0),
            clock,
        }
    }

    /// Fit a light controller, enabling [`follow_line`](Self::follow_line).
    /// The find powers drive the search when the line drops out of sight.
    pub fn with_line_follower(
        mut self,
        light: PidController,
        find_drive_power: f64,
        find_turn_power: f64,
    ) -> Self {
        self.line = Some(LineFollow {
            pid: light,
            drive_power: 0.0,
            find_drive_power,
            find_turn_power,
        });
        self
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.flags.contains(DriveFlags::ACTIVE)
    }

    #[inline]
    pub fn is_turn_only(&self) -> bool {
        self.flags.contains(DriveFlags::TURN_ONLY)
    }

    #[inline]
    pub fn is_manual(&self) -> bool {
        self.flags.contains(DriveFlags::MANUAL_DRIVE)
    }

    #[inline]
    pub fn is_following_line(&self) -> bool {
        self.flags.contains(DriveFlags::FOLLOW_LINE)
    }

    pub fn light_pid(&self) -> Option<&PidController> {
        self.line.as_ref().map(|line| &line.pid)
    }

    pub fn light_pid_mut(&mut self) -> Option<&mut PidController> {
        self.line.as_mut().map(|line| &mut line.pid)
    }

    pub fn x_pid(&self) -> Option<&PidController> {
        self.x.as_ref()
    }

    pub fn x_pid_mut(&mut self) -> Option<&mut PidController> {
        self.x.as_mut()
    }

    pub fn y_pid(&self) -> &PidController {
        &self.y
    }

    pub fn y_pid_mut(&mut self) -> &mut PidController {
        &mut self.y
    }

    pub fn turn_pid(&self) -> &PidController {
        &self.turn
    }

    pub fn turn_pid_mut(&mut self) -> &mut PidController {
        &mut self.turn
    }

    /// Arm every present axis relative to its current reading.
    pub fn set_target(&mut self, input: &dyn PidInputSource, target: DriveTarget) {
        if let Some(x) = &mut self.x {
            x.set_target(target.dx, input.pid_input(PidAxis::X), false);
        }
        self.y.set_target(target.dy, input.pid_input(PidAxis::Y), false);
        self.turn
            .set_target(target.d_angle, input.pid_input(PidAxis::Turn), false);

        self.deadline_ms = deadline_after(self.clock.now_ms(), target.timeout_ms);
        self.flags = DriveFlags::ACTIVE;
        self.flags
            .set(DriveFlags::STOP_ON_TARGET, target.stop_on_target);
        self.flags.set(DriveFlags::TURN_ONLY, target.is_turn_only());
        debug!(
            drive = self.name,
            dx = target.dx,
            dy = target.dy,
            d_angle = target.d_angle,
            stop_on_target = target.stop_on_target,
            timeout_ms = target.timeout_ms,
            "drive target armed"
        );
        self.event = target.event;
    }

    /// Hold heading `angle` (relative to the current heading) while driving
    /// with constant translation power. Holonomic only: returns `false` and
    /// changes nothing on other chassis.
    pub fn set_angle_target(
        &mut self,
        input: &dyn PidInputSource,
        x_power: f64,
        y_power: f64,
        angle: f64,
    ) -> bool {
        if !self.chassis.is_holonomic() {
            return false;
        }
        self.manual_power = (x_power, y_power);
        self.turn
            .set_target(angle, input.pid_input(PidAxis::Turn), false);
        self.flags = DriveFlags::ACTIVE | DriveFlags::MANUAL_DRIVE;
        self.event = None;
        self.deadline_ms = None;
        debug!(drive = self.name, x_power, y_power, angle, "heading hold armed");
        true
    }

    /// Follow the line under the light array. Returns `false` and changes
    /// nothing when no light controller is fitted.
    pub fn follow_line(&mut self, input: &dyn PidInputSource, target: LineTarget) -> bool {
        let Some(line) = &mut self.line else {
            warn!(drive = self.name, "follow_line without a light controller");
            return false;
        };
        line.pid
            .set_target(target.position, input.pid_input(PidAxis::Light), true);
        line.drive_power = target.drive_power;
        self.flags = DriveFlags::ACTIVE | DriveFlags::FOLLOW_LINE;
        self.deadline_ms = deadline_after(self.clock.now_ms(), target.timeout_ms);
        debug!(
            drive = self.name,
            position = target.position,
            drive_power = target.drive_power,
            timeout_ms = target.timeout_ms,
            "line follow armed"
        );
        self.event = target.event;
        true
    }

    /// Zero the drivetrain, reset every controller and clear all flags.
    /// Safe to call at any time, any number of times.
    pub fn stop(&mut self, out: &mut dyn DriveOutput) {
        let was_active = self.is_active();
        out.stop_motors();
        if let Some(x) = &mut self.x {
            x.reset();
        }
        self.y.reset();
        self.turn.reset();
        if let Some(line) = &mut self.line {
            line.pid.reset();
        }
        self.flags = DriveFlags::empty();
        self.event = None;
        self.deadline_ms = None;
        self.manual_power = (0.0, 0.0);
        if was_active {
            info!(drive = self.name, "drive stopped");
        }
    }

    /// One control step; runs in the post-periodic phase.
    pub fn update(&mut self, input: &dyn PidInputSource, out: &mut dyn DriveOutput) {
        if !self.is_active() {
            return;
        }

        if self.is_manual() {
            let (xp, yp) = self.manual_power;
            let turn = self.turn.compute_output(input.pid_input(PidAxis::Turn));
            out.mecanum_polar(magnitude(xp, yp), direction_degrees(xp, yp), turn);
            return;
        }

        if self.is_following_line() {
            self.follow_line_step(input, out);
            return;
        }

        let expired = deadline_reached(self.deadline_ms, self.clock.now_ms());
        if expired || self.axes_on_target() {
            if self.flags.contains(DriveFlags::STOP_ON_TARGET) {
                self.finish(out);
                debug!(drive = self.name, expired, "drive move complete");
            } else if self.chassis.is_holonomic() {
                out.mecanum_polar(0.0, 0.0, 0.0);
            } else {
                out.arcade(0.0, 0.0);
            }
            return;
        }

        let y_power = self.y.compute_output(input.pid_input(PidAxis::Y));
        let turn_power = self.turn.compute_output(input.pid_input(PidAxis::Turn));
        if self.chassis.is_holonomic() {
            let x_power = match &mut self.x {
                Some(x) => x.compute_output(input.pid_input(PidAxis::X)),
                None => 0.0,
            };
            out.mecanum_polar(
                magnitude(x_power, y_power),
                direction_degrees(x_power, y_power),
                turn_power,
            );
            trace!(drive = self.name, x_power, y_power, turn_power, "drive output");
        } else {
            out.arcade(y_power, turn_power);
            trace!(drive = self.name, y_power, turn_power, "drive output");
        }
    }

    fn finish(&mut self, out: &mut dyn DriveOutput) {
        let event = self.event.take();
        self.stop(out);
        if let Some(ev) = event {
            ev.set();
        }
    }

    fn follow_line_step(&mut self, input: &dyn PidInputSource, out: &mut dyn DriveOutput) {
        let pattern = input.line_pattern().unwrap_or(LinePattern::NO_LINE);
        let expired = deadline_reached(self.deadline_ms, self.clock.now_ms());
        if expired || pattern.is_junction() {
            self.finish(out);
            debug!(drive = self.name, expired, pattern = pattern.bits(), "line follow complete");
            return;
        }
        let Some(line) = &mut self.line else {
            return;
        };

        let position = input.pid_input(PidAxis::Light);
        let (forward, rotation) = if pattern == LinePattern::NO_LINE {
            // Search back toward the side the line was last seen on.
            let toward = if position > 0.0 {
                -1.0
            } else if position < 0.0 {
                1.0
            } else {
                0.0
            };
            (line.find_drive_power, toward * line.find_turn_power)
        } else {
            (line.drive_power, line.pid.compute_output(position))
        };

        if self.chassis.is_holonomic() {
            out.mecanum_polar(forward, 0.0, rotation);
        } else {
            out.arcade(forward, rotation);
        }
        trace!(drive = self.name, pattern = pattern.bits(), forward, rotation, "line follow output");
    }

    fn axes_on_target(&self) -> bool {
        self.turn.is_on_target()
            && (self.is_turn_only()
                || (self.y.is_on_target() && self.x.as_ref().is_none_or(|x| x.is_on_target())))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
