//! Inert devices for dry runs and benchmarks: motors remember their last
//! output and every input reads a constant.

use mecha_common::hal::{DigitalSource, Gyro, MotorOutput, StickAxis, StickInput, WheelEncoder};

use crate::robot::RobotHardware;
use crate::robot::chassis::ChassisHardware;

#[derive(Debug, Default)]
pub struct InertMotor {
    output: f64,
}

impl MotorOutput for InertMotor {
    fn set_output(&mut self, value: f64, _sync_group: u8) {
        self.output = value;
    }

    fn output(&self) -> f64 {
        self.output
    }
}

#[derive(Debug, Default)]
pub struct InertEncoder;

impl WheelEncoder for InertEncoder {
    fn position(&self) -> f64 {
        0.0
    }
}

#[derive(Debug, Default)]
pub struct InertGyro;

impl Gyro for InertGyro {
    fn angle(&self) -> f64 {
        0.0
    }

    fn reset(&mut self) {}
}

/// Digital source that always reads the wrapped word.
#[derive(Debug, Default)]
pub struct ConstantWord(pub u32);

impl DigitalSource for ConstantWord {
    fn sample(&mut self) -> u32 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct CenteredStick;

impl StickInput for CenteredStick {
    fn axis(&self, _axis: StickAxis) -> f64 {
        0.0
    }
}

/// A full robot of inert devices with a single joystick.
pub fn inert_robot_hardware() -> RobotHardware {
    RobotHardware {
        chassis: ChassisHardware {
            motors: std::array::from_fn(|_| Box::new(InertMotor::default()) as Box<dyn MotorOutput>),
            encoders: std::array::from_fn(|_| Box::new(InertEncoder) as Box<dyn WheelEncoder>),
            gyro: Box::new(InertGyro),
            line_sensors: Some(Box::new(ConstantWord(0))),
        },
        left_stick: Box::new(CenteredStick),
        left_buttons: Box::new(ConstantWord(0)),
        right_stick: None,
        digital_in: Box::new(ConstantWord(0)),
    }
}
