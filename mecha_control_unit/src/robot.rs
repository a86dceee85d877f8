//! Robot root: builds the subsystems from configuration, registers their
//! tasks and routes the mode lifecycle to the autonomous and teleop
//! routines.
//!
//! ## Task Order
//! | Task | Phases |
//! |------|--------|
//! | `left_buttons` | pre-periodic |
//! | `right_buttons` (dual stick only) | pre-periodic |
//! | `digital_in` | pre-periodic |
//! | `auto_sm` | pre-periodic |
//! | `drive_base` | start, stop, post-periodic |
//!
//! Dispatchers run before the state machine so a listener can signal an
//! event the machine sees in the same tick.

pub mod autonomous;
pub mod chassis;
pub mod drive_base;
pub mod teleop;

use std::cell::RefCell;
use std::rc::Rc;

use mecha_common::hal::{DigitalSource, StickInput};
use mecha_common::robot::config::RobotConfig;
use mecha_common::robot::state::RobotMode;
use tracing::{debug, info, warn};

use self::autonomous::Autonomous;
use self::chassis::ChassisHardware;
use self::drive_base::DriveBase;
use self::teleop::Teleop;
use crate::cycle::ModeHandler;
use crate::error::SchedulerError;
use crate::event::SharedClock;
use crate::input::edge::{EdgeDispatcher, EdgeEvent};
use crate::input::joystick::{Joystick, button_dispatcher};
use crate::state::machine::StateMachine;
use crate::task::{Scheduler, TaskHandle};

pub const LEFT_STICK_PORT: u8 = 1;
pub const RIGHT_STICK_PORT: u8 = 2;
pub const DIGITAL_IN_SOURCE: u8 = 0;
/// Channels on the digital input module.
pub const DIGITAL_IN_WIDTH: u32 = 14;

/// Operator-station and sensor devices besides the chassis.
pub struct RobotHardware {
    pub chassis: ChassisHardware,
    pub left_stick: Box<dyn StickInput>,
    pub left_buttons: Box<dyn DigitalSource>,
    /// Second stick; without it the left stick's Z and twist axes stand in.
    pub right_stick: Option<(Box<dyn StickInput>, Box<dyn DigitalSource>)>,
    pub digital_in: Box<dyn DigitalSource>,
}

pub struct Robot {
    drive_base: Rc<RefCell<DriveBase>>,
    auto_sm: Rc<RefCell<StateMachine>>,
    digital_in: Rc<RefCell<EdgeDispatcher>>,
    autonomous: Autonomous,
    teleop: Teleop,
}

impl Robot {
    /// Build every subsystem and register its task with `scheduler`.
    ///
    /// # Errors
    /// Propagates task registration failures. Tasks registered before the
    /// failure stay registered.
    pub fn build(
        config: &RobotConfig,
        hardware: RobotHardware,
        clock: SharedClock,
        scheduler: &mut Scheduler,
    ) -> Result<Self, SchedulerError> {
        let RobotHardware {
            chassis,
            left_stick,
            left_buttons,
            right_stick,
            digital_in,
        } = hardware;
        let deadband = config.teleop.deadband;

        let left = Joystick::new(left_stick, deadband);
        let mut left_buttons = button_dispatcher("left_buttons", LEFT_STICK_PORT, left_buttons);
        let (right, right_buttons) = match right_stick {
            Some((stick, buttons)) => (
                Some(Joystick::new(stick, deadband)),
                Some(button_dispatcher("right_buttons", RIGHT_STICK_PORT, buttons)),
            ),
            None => (None, None),
        };

        let teleop = Teleop::new(&config.teleop, left, right);
        if config.drive.chassis.is_holonomic() && !teleop.attach_toggle(&mut left_buttons) {
            warn!("mecanum toggle not registered: button listener table full");
        }

        let mut digital_in =
            EdgeDispatcher::new("digital_in", DIGITAL_IN_SOURCE, digital_in, DIGITAL_IN_WIDTH);
        let logged = digital_in.register_listener(
            u32::MAX,
            Box::new(|ev: EdgeEvent| {
                debug!(channel = ev.channel, active = ev.active, "digital input changed");
            }),
        );
        if !logged {
            warn!("digital input listener not registered");
        }

        let drive_base = Rc::new(RefCell::new(DriveBase::new(
            chassis,
            &config.drive,
            clock.clone(),
        )));
        let auto_sm = Rc::new(RefCell::new(StateMachine::new("auto_sm", clock)));
        let digital_in = Rc::new(RefCell::new(digital_in));

        scheduler.register(
            "left_buttons",
            EdgeDispatcher::PHASES,
            Rc::new(RefCell::new(left_buttons)) as TaskHandle,
        )?;
        if let Some(right_buttons) = right_buttons {
            scheduler.register(
                "right_buttons",
                EdgeDispatcher::PHASES,
                Rc::new(RefCell::new(right_buttons)) as TaskHandle,
            )?;
        }
        scheduler.register("digital_in", EdgeDispatcher::PHASES, digital_in.clone() as TaskHandle)?;
        scheduler.register("auto_sm", StateMachine::PHASES, auto_sm.clone() as TaskHandle)?;
        scheduler.register("drive_base", DriveBase::PHASES, drive_base.clone() as TaskHandle)?;
        info!(tasks = scheduler.len(), "robot built");

        Ok(Self {
            drive_base,
            auto_sm,
            digital_in,
            autonomous: Autonomous::new(),
            teleop,
        })
    }

    pub fn drive_base(&self) -> &Rc<RefCell<DriveBase>> {
        &self.drive_base
    }

    pub fn auto_sm(&self) -> &Rc<RefCell<StateMachine>> {
        &self.auto_sm
    }

    pub fn digital_in(&self) -> &Rc<RefCell<EdgeDispatcher>> {
        &self.digital_in
    }

    pub fn teleop(&self) -> &Teleop {
        &self.teleop
    }
}

impl ModeHandler for Robot {
    fn on_mode_start(&mut self, mode: RobotMode) {
        match mode {
            RobotMode::Autonomous => {
                let Ok(mut sm) = self.auto_sm.try_borrow_mut() else {
                    warn!("state machine busy, autonomous not started");
                    return;
                };
                self.autonomous.start(&mut sm);
            }
            RobotMode::TeleOp => self.teleop.start(),
            RobotMode::Disabled => {}
        }
    }

    fn on_mode_periodic(&mut self, mode: RobotMode) {
        match mode {
            RobotMode::Autonomous => {
                let (Ok(mut sm), Ok(mut drive)) =
                    (self.auto_sm.try_borrow_mut(), self.drive_base.try_borrow_mut())
                else {
                    warn!("autonomous step skipped, subsystem busy");
                    return;
                };
                self.autonomous.periodic(&mut sm, &mut *drive);
            }
            RobotMode::TeleOp => {
                let Ok(mut drive) = self.drive_base.try_borrow_mut() else {
                    warn!("teleop step skipped, drive base busy");
                    return;
                };
                self.teleop.periodic(&mut drive);
            }
            RobotMode::Disabled => {}
        }
    }

    fn on_mode_stop(&mut self, mode: RobotMode) {
        match mode {
            RobotMode::Autonomous => {
                let Ok(mut sm) = self.auto_sm.try_borrow_mut() else {
                    warn!("state machine busy, autonomous not stopped");
                    return;
                };
                self.autonomous.stop(&mut sm);
            }
            RobotMode::TeleOp => self.teleop.stop(),
            RobotMode::Disabled => {}
        }
    }
}
