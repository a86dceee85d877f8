//! Hardware capabilities consumed by the control core.
//!
//! The core never talks to motor controllers, encoders, gyros or HID devices
//! directly. It only sees these narrow numeric interfaces; concrete backends
//! live with the surrounding robot program.

pub mod io;

pub use io::{DigitalSource, Gyro, MotorOutput, StickAxis, StickInput, WheelEncoder};
