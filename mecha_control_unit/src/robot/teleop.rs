//! Operator control: joystick mixing for tank or arcade stick layouts, with
//! a button toggling holonomic (mecanum) driving.

use std::cell::Cell;
use std::rc::Rc;

use mecha_common::robot::config::{StickLayout, TeleopConfig};
use tracing::{info, trace};

use super::drive_base::DriveBase;
use crate::control::kinematics::{direction_degrees, magnitude};
use crate::input::edge::{EdgeDispatcher, EdgeEvent};
use crate::input::joystick::Joystick;

/// Scaled stick positions, forward positive on Y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickReading {
    pub left_x: f64,
    pub left_y: f64,
    pub right_x: f64,
    pub right_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TeleopDrive {
    Mecanum {
        magnitude: f64,
        direction_deg: f64,
        rotation: f64,
    },
    Arcade {
        forward: f64,
        rotation: f64,
    },
    Tank {
        left: f64,
        right: f64,
    },
}

/// Mix a stick reading into a drivetrain command.
///
/// Tank layout crabs only when both sticks lean the same way, so toeing the
/// sticks in or out while tank driving never crabs. Arcade layout ignores
/// rotation while crabbing so heading is kept.
pub fn mix(layout: StickLayout, mecanum: bool, s: &StickReading) -> TeleopDrive {
    let (x, y, rotation) = match layout {
        StickLayout::Tank => {
            let same_sign = (s.left_x < 0.0 && s.right_x < 0.0) || (s.left_x > 0.0 && s.right_x > 0.0);
            let x = if same_sign {
                (s.left_x + s.right_x) / 2.0
            } else {
                0.0
            };
            (x, (s.left_y + s.right_y) / 2.0, (s.left_y - s.right_y) / 2.0)
        }
        StickLayout::Arcade => {
            let x = s.right_x;
            let rotation = if x == 0.0 { s.left_x } else { 0.0 };
            (x, s.left_y, rotation)
        }
    };

    if mecanum {
        TeleopDrive::Mecanum {
            magnitude: magnitude(x, y),
            direction_deg: direction_degrees(x, y),
            rotation,
        }
    } else {
        match layout {
            StickLayout::Tank => TeleopDrive::Tank {
                left: s.left_y,
                right: s.right_y,
            },
            StickLayout::Arcade => TeleopDrive::Arcade {
                forward: y,
                rotation,
            },
        }
    }
}

pub struct Teleop {
    layout: StickLayout,
    drive_scale: f64,
    toggle_mask: u32,
    left: Joystick,
    right: Option<Joystick>,
    mecanum: Rc<Cell<bool>>,
}

impl Teleop {
    /// With one joystick its Z and twist axes act as the right stick.
    pub fn new(config: &TeleopConfig, left: Joystick, right: Option<Joystick>) -> Self {
        Self {
            layout: config.layout,
            drive_scale: config.drive_scale,
            toggle_mask: config.mecanum_toggle_button,
            left,
            right,
            mecanum: Rc::new(Cell::new(false)),
        }
    }

    /// Toggle mecanum mode on each press of the configured button.
    #[must_use]
    pub fn attach_toggle(&self, buttons: &mut EdgeDispatcher) -> bool {
        let mecanum = Rc::clone(&self.mecanum);
        buttons.register_listener(
            self.toggle_mask,
            Box::new(move |ev: EdgeEvent| {
                if ev.active {
                    mecanum.set(!mecanum.get());
                    info!(mecanum = mecanum.get(), "drive mode toggled");
                }
            }),
        )
    }

    #[inline]
    pub fn is_mecanum(&self) -> bool {
        self.mecanum.get()
    }

    pub fn start(&mut self) {
        self.mecanum.set(false);
        info!(layout = ?self.layout, "teleop started");
    }

    pub fn stop(&mut self) {
        info!("teleop stopped");
    }

    pub fn sticks(&self) -> StickReading {
        let k = self.drive_scale;
        let (right_x, right_y) = match &self.right {
            Some(right) => (right.x(), right.y()),
            None => (self.left.z(), self.left.twist()),
        };
        StickReading {
            left_x: self.left.x() * k,
            left_y: -self.left.y() * k,
            right_x: right_x * k,
            right_y: -right_y * k,
        }
    }

    pub fn periodic(&mut self, drive: &mut DriveBase) {
        let sticks = self.sticks();
        let command = mix(self.layout, self.is_mecanum(), &sticks);
        trace!(?sticks, ?command, "teleop command");
        match command {
            TeleopDrive::Mecanum {
                magnitude,
                direction_deg,
                rotation,
            } => drive.mecanum_drive_polar(magnitude, direction_deg, rotation),
            TeleopDrive::Arcade { forward, rotation } => drive.arcade_drive(forward, rotation),
            TeleopDrive::Tank { left, right } => drive.tank_drive(left, right),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
