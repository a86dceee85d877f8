//! Narrow sensor and actuator traits.
//!
//! | Trait | Direction | Used by |
//! |-------|-----------|---------|
//! | [`MotorOutput`] | write | PID motor, drive chassis |
//! | [`WheelEncoder`] | read | position estimator |
//! | [`Gyro`] | read | heading controller |
//! | [`DigitalSource`] | read | edge dispatcher |
//! | [`StickInput`] | read | joystick |

/// A single speed-controlled actuator.
pub trait MotorOutput {
    /// Command an output in `[-1, 1]`.
    ///
    /// When `sync_group` is non-zero the write is staged and only applied by
    /// [`MotorOutput::apply_sync_group`], so paired motors change together.
    fn set_output(&mut self, value: f64, sync_group: u8);

    /// Apply all writes staged for `sync_group`. Backends without
    /// synchronized apply leave this as a no-op.
    fn apply_sync_group(&mut self, _sync_group: u8) {}

    /// Last commanded output.
    fn output(&self) -> f64;
}

/// Accumulated wheel travel in raw encoder units.
pub trait WheelEncoder {
    fn position(&self) -> f64;
}

/// Heading sensor in degrees, clockwise positive.
pub trait Gyro {
    fn angle(&self) -> f64;

    /// Re-zero the heading.
    fn reset(&mut self);
}

/// Raw N-bit digital word (digital inputs, IO expander, joystick buttons).
pub trait DigitalSource {
    fn sample(&mut self) -> u32;
}

/// Joystick axes as reported by the HID layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickAxis {
    X,
    Y,
    Z,
    Twist,
}

/// Raw joystick axis reads, each in `[-1, 1]`.
pub trait StickInput {
    fn axis(&self, axis: StickAxis) -> f64;
}
