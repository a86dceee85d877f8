//! Driver joystick: deadbanded axes and polar helpers.
//!
//! Buttons are not read here. They arrive as a digital word through an
//! [`EdgeDispatcher`](super::edge::EdgeDispatcher) built with
//! [`button_dispatcher`].

use mecha_common::hal::{DigitalSource, StickAxis, StickInput};

use super::edge::EdgeDispatcher;
use crate::control::kinematics::{direction_degrees, magnitude};

/// Buttons reported by a standard gamepad.
pub const JOYSTICK_BUTTON_COUNT: u32 = 12;

pub struct Joystick {
    stick: Box<dyn StickInput>,
    deadband: f64,
}

impl Joystick {
    pub fn new(stick: Box<dyn StickInput>, deadband: f64) -> Self {
        Self {
            stick,
            deadband: deadband.abs(),
        }
    }

    pub fn raw(&self, axis: StickAxis) -> f64 {
        self.stick.axis(axis)
    }

    /// Axis value with readings inside the deadband forced to zero.
    pub fn axis(&self, axis: StickAxis) -> f64 {
        let value = self.stick.axis(axis);
        if value.abs() < self.deadband { 0.0 } else { value }
    }

    pub fn x(&self) -> f64 {
        self.axis(StickAxis::X)
    }

    pub fn y(&self) -> f64 {
        self.axis(StickAxis::Y)
    }

    pub fn z(&self) -> f64 {
        self.axis(StickAxis::Z)
    }

    pub fn twist(&self) -> f64 {
        self.axis(StickAxis::Twist)
    }

    /// Stick deflection, capped at 1.
    pub fn magnitude(&self) -> f64 {
        magnitude(self.x(), self.y()).min(1.0)
    }

    /// Stick direction in degrees, 0 = pushed forward, clockwise positive.
    /// HID reports forward as negative Y.
    pub fn direction_degrees(&self) -> f64 {
        direction_degrees(self.x(), -self.y())
    }
}

/// Edge dispatcher over a joystick's button word.
pub fn button_dispatcher(name: &'static str, port: u8, buttons: Box<dyn DigitalSource>) -> EdgeDispatcher {
    EdgeDispatcher::new(name, port, buttons, JOYSTICK_BUTTON_COUNT)
}

// ─── Tests ──────────────────────────────────────────────────────────
