//! Robot mode and chassis enums.
//!
//! All enums use `#[repr(u8)]` so hosts can pass them as raw bytes.

use serde::{Deserialize, Serialize};

use crate::consts::WHEEL_COUNT;

/// Competition mode selected by the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RobotMode {
    /// Outputs disabled, no routine running.
    #[default]
    Disabled = 0,
    /// Pre-programmed routine, no driver input.
    Autonomous = 1,
    /// Driver-controlled.
    TeleOp = 2,
}

impl RobotMode {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::Autonomous),
            2 => Some(Self::TeleOp),
            _ => None,
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Autonomous => "autonomous",
            Self::TeleOp => "teleop",
        }
    }
}

/// Drivetrain kinematics, resolved once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ChassisKind {
    /// Differential drive: forward + rotation only.
    Tank = 0,
    /// Holonomic mecanum drive: lateral, forward and rotation.
    #[default]
    Mecanum = 1,
}

impl ChassisKind {
    #[inline]
    pub const fn is_holonomic(self) -> bool {
        matches!(self, Self::Mecanum)
    }
}

/// Drive wheel positions, in the order used by all per-wheel arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Wheel {
    LeftFront = 0,
    LeftRear = 1,
    RightFront = 2,
    RightRear = 3,
}

impl Wheel {
    pub const ALL: [Wheel; WHEEL_COUNT] = [
        Wheel::LeftFront,
        Wheel::LeftRear,
        Wheel::RightFront,
        Wheel::RightRear,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn is_left(self) -> bool {
        matches!(self, Self::LeftFront | Self::LeftRear)
    }
}
