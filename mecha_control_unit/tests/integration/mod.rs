//! Shared fixtures: shared-cell devices and a kinematic chassis plant.

mod autonomous_sequence;
mod closed_loop;
mod edge_ordering;
mod motor_pair;
mod params;

use std::cell::Cell;
use std::rc::Rc;

use mecha_common::consts::WHEEL_COUNT;
use mecha_common::hal::{DigitalSource, Gyro, MotorOutput, StickAxis, StickInput, WheelEncoder};
use mecha_common::robot::config::{PidConfig, RobotConfig};
use mecha_control_unit::robot::RobotHardware;
use mecha_control_unit::robot::chassis::ChassisHardware;

pub struct SharedMotor(pub Rc<Cell<f64>>);

impl MotorOutput for SharedMotor {
    fn set_output(&mut self, value: f64, _sync_group: u8) {
        self.0.set(value);
    }

    fn output(&self) -> f64 {
        self.0.get()
    }
}

pub struct SharedEncoder(pub Rc<Cell<f64>>);

impl WheelEncoder for SharedEncoder {
    fn position(&self) -> f64 {
        self.0.get()
    }
}

pub struct SharedGyro(pub Rc<Cell<f64>>);

impl Gyro for SharedGyro {
    fn angle(&self) -> f64 {
        self.0.get()
    }

    fn reset(&mut self) {
        self.0.set(0.0);
    }
}

pub struct SharedWord(pub Rc<Cell<u32>>);

impl DigitalSource for SharedWord {
    fn sample(&mut self) -> u32 {
        self.0.get()
    }
}

/// Stick whose axes are set by the test, indexed by [`StickAxis`].
pub struct SharedStick(pub Rc<Cell<[f64; 4]>>);

impl StickInput for SharedStick {
    fn axis(&self, axis: StickAxis) -> f64 {
        self.0.get()[axis as usize]
    }
}

/// Encoder units a wheel travels per tick at full output.
pub const UNITS_PER_TICK: f64 = 10.0;
/// Gyro degrees per unit of mean raw wheel travel.
pub const DEGREES_PER_UNIT: f64 = 1.0;

/// Kinematic plant behind a simulated chassis. Encoders integrate the
/// motor outputs, the gyro integrates the side difference.
pub struct SimRig {
    pub motors: [Rc<Cell<f64>>; WHEEL_COUNT],
    pub encoders: [Rc<Cell<f64>>; WHEEL_COUNT],
    pub gyro: Rc<Cell<f64>>,
    pub stick: Rc<Cell<[f64; 4]>>,
    pub buttons: Rc<Cell<u32>>,
    pub digital_in: Rc<Cell<u32>>,
}

impl SimRig {
    pub fn new() -> Self {
        Self {
            motors: std::array::from_fn(|_| Rc::new(Cell::new(0.0))),
            encoders: std::array::from_fn(|_| Rc::new(Cell::new(0.0))),
            gyro: Rc::new(Cell::new(0.0)),
            stick: Rc::new(Cell::new([0.0; 4])),
            buttons: Rc::new(Cell::new(0)),
            digital_in: Rc::new(Cell::new(0)),
        }
    }

    pub fn hardware(&self) -> RobotHardware {
        RobotHardware {
            chassis: ChassisHardware {
                motors: std::array::from_fn(|i| {
                    Box::new(SharedMotor(self.motors[i].clone())) as Box<dyn MotorOutput>
                }),
                encoders: std::array::from_fn(|i| {
                    Box::new(SharedEncoder(self.encoders[i].clone())) as Box<dyn WheelEncoder>
                }),
                gyro: Box::new(SharedGyro(self.gyro.clone())),
                // Light sensors share the digital input bank.
                line_sensors: Some(Box::new(SharedWord(self.digital_in.clone()))),
            },
            left_stick: Box::new(SharedStick(self.stick.clone())),
            left_buttons: Box::new(SharedWord(self.buttons.clone())),
            right_stick: None,
            digital_in: Box::new(SharedWord(self.digital_in.clone())),
        }
    }

    /// Advance the plant by one tick of the current motor outputs.
    ///
    /// Raw encoder counts follow the motor output. Right-side motors are
    /// mounted mirrored, so equal raw travel on all four wheels spins the
    /// chassis clockwise and opposite raw travel per side drives it straight.
    pub fn step(&self) {
        let mut spin = 0.0;
        for i in 0..WHEEL_COUNT {
            let raw_delta = self.motors[i].get() * UNITS_PER_TICK;
            self.encoders[i].set(self.encoders[i].get() + raw_delta);
            spin += raw_delta;
        }
        self.gyro
            .set(self.gyro.get() + spin / WHEEL_COUNT as f64 * DEGREES_PER_UNIT);
    }

    pub fn wheel_outputs(&self) -> [f64; WHEEL_COUNT] {
        std::array::from_fn(|i| self.motors[i].get())
    }
}

/// Mecanum robot with proportional-only loops that converge on [`SimRig`].
pub fn sim_config() -> RobotConfig {
    let axis = PidConfig {
        kp: 0.05,
        ki: 0.0,
        kd: 0.0,
        tolerance: 0.5,
        settling_ms: 200,
        ..PidConfig::drive()
    };
    let mut config = RobotConfig::default();
    config.drive.x_pid = Some(axis);
    config.drive.y_pid = axis;
    config.drive.turn_pid = axis;
    config.drive.distance_per_unit = 1.0;
    config.drive.squared_inputs = false;
    config
}
