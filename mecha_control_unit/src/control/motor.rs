//! PID-driven actuator: one motor, or two motors in a sync group, moved to
//! a setpoint with optional completion notification and timeout.

use bitflags::bitflags;
use mecha_common::hal::MotorOutput;
use mecha_common::robot::state::RobotMode;
use tracing::{debug, info, trace};

use super::kinematics::{PidAxis, PidInputSource};
use super::pid::PidController;
use crate::event::{Event, SharedClock, deadline_after, deadline_reached};
use crate::task::{Task, TaskPhases};

bitflags! {
    /// Construction-time behaviour options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MotorOptions: u8 {
        /// Negate the PID output before writing.
        const INVERSE = 0x01;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct MotorFlags: u8 {
        const ACTIVE         = 0x01;
        const STOP_ON_TARGET = 0x02;
    }
}

impl Default for MotorOptions {
    fn default() -> Self {
        Self::empty()
    }
}

/// Second motor of a mechanically linked pair.
struct FollowerMotor {
    motor: Box<dyn MotorOutput>,
    sync_group: u8,
}

pub struct PidMotor {
    name: &'static str,
    pid: PidController,
    axis: PidAxis,
    input: Box<dyn PidInputSource>,
    primary: Box<dyn MotorOutput>,
    follower: Option<FollowerMotor>,
    options: MotorOptions,
    flags: MotorFlags,
    event: Option<Event>,
    deadline_ms: Option<u64>,
    clock: SharedClock,
}

impl PidMotor {
    /// Phases a PID motor registers for.
    pub const PHASES: TaskPhases = TaskPhases::from_bits_truncate(
        TaskPhases::STOP_MODE.bits() | TaskPhases::POST_PERIODIC.bits(),
    );

    pub fn new(
        name: &'static str,
        pid: PidController,
        axis: PidAxis,
        input: Box<dyn PidInputSource>,
        motor: Box<dyn MotorOutput>,
        options: MotorOptions,
        clock: SharedClock,
    ) -> Self {
        Self {
            name,
            pid,
            axis,
            input,
            primary: motor,
            follower: None,
            options,
            flags: MotorFlags::empty(),
            event: None,
            deadline_ms: None,
            clock,
        }
    }

    /// Add a second motor. Both motors are written under `sync_group` and
    /// applied together after the second write.
    pub fn with_follower(mut self, motor: Box<dyn MotorOutput>, sync_group: u8) -> Self {
        self.follower = Some(FollowerMotor { motor, sync_group });
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.flags.contains(MotorFlags::ACTIVE)
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn pid_mut(&mut self) -> &mut PidController {
        &mut self.pid
    }

    /// Arm a move to `setpoint`.
    ///
    /// A `timeout_ms` of zero means no deadline. The previous target, if any,
    /// is replaced without signaling its event.
    pub fn set_target(
        &mut self,
        setpoint: f64,
        stop_on_target: bool,
        event: Option<&Event>,
        timeout_ms: u64,
    ) {
        let input = self.input.pid_input(self.axis);
        let absolute = self.pid.is_absolute_setpoint();
        self.pid.set_target(setpoint, input, absolute);
        self.event = event.cloned();
        self.deadline_ms = deadline_after(self.clock.now_ms(), timeout_ms);
        self.flags = MotorFlags::ACTIVE;
        self.flags.set(MotorFlags::STOP_ON_TARGET, stop_on_target);
        debug!(
            motor = self.name,
            setpoint,
            stop_on_target,
            timeout_ms,
            "motor target armed"
        );
    }

    /// Open-loop drive. Cancels any PID move without signaling its event.
    pub fn set_power(&mut self, power: f64) {
        self.cancel();
        self.write(power.clamp(-1.0, 1.0));
    }

    /// Zero the motors, reset the controller and clear all flags. Safe to call
    /// at any time, any number of times.
    pub fn stop(&mut self) {
        let was_active = self.is_active();
        self.cancel();
        self.write(0.0);
        if was_active {
            info!(motor = self.name, "motor stopped");
        }
    }

    /// One control step; runs in the post-periodic phase.
    pub fn update(&mut self) {
        if !self.is_active() {
            return;
        }

        let on_target =
            self.flags.contains(MotorFlags::STOP_ON_TARGET) && self.pid.is_on_target();
        let expired = deadline_reached(self.deadline_ms, self.clock.now_ms());
        if on_target || expired {
            let event = self.event.take();
            self.stop();
            if let Some(ev) = event {
                ev.set();
            }
            debug!(motor = self.name, on_target, expired, "motor move complete");
            return;
        }

        let mut output = self.pid.compute_output(self.input.pid_input(self.axis));
        if self.options.contains(MotorOptions::INVERSE) {
            output = -output;
        }
        self.write(output);
        trace!(motor = self.name, output, "motor output");
    }

    fn cancel(&mut self) {
        self.pid.reset();
        self.flags = MotorFlags::empty();
        self.event = None;
        self.deadline_ms = None;
    }

    fn write(&mut self, value: f64) {
        match &mut self.follower {
            Some(follower) => {
                self.primary.set_output(value, follower.sync_group);
                follower.motor.set_output(value, follower.sync_group);
                follower.motor.apply_sync_group(follower.sync_group);
            }
            None => self.primary.set_output(value, 0),
        }
    }
}

impl Task for PidMotor {
    fn stop_mode(&mut self, _mode: RobotMode) {
        self.stop();
    }

    fn post_periodic(&mut self, _mode: RobotMode) {
        self.update();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
