//! Drivetrain mixing laws and wheel-odometry position estimate.
//!
//! Per-wheel arrays are ordered LF, LR, RF, RR (see [`Wheel`]). Wheel
//! speeds are expressed in the wheel's own forward frame; motor inversion
//! and encoder polarity are applied by the chassis, not here.

use mecha_common::consts::WHEEL_COUNT;
use mecha_common::robot::state::Wheel;

use crate::input::line::LinePattern;

/// Which PID axis a reading is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PidAxis {
    /// Lateral (crab) distance.
    X,
    /// Forward distance.
    Y,
    /// Heading in degrees.
    Turn,
    /// Line position under the light array, -2 (far right) to 2 (far left).
    Light,
    /// Mechanism-specific sensor, e.g. an arm potentiometer.
    Aux(u8),
}

/// Sensor-read capability consumed by PID motors and the PID drive.
pub trait PidInputSource {
    fn pid_input(&self, axis: PidAxis) -> f64;

    /// Latest light-array pattern. `None` when no array is fitted.
    fn line_pattern(&self) -> Option<LinePattern> {
        None
    }
}

/// Mixed drivetrain command sink.
pub trait DriveOutput {
    /// Differential drive from forward power and rotation.
    fn arcade(&mut self, forward: f64, rotation: f64);

    /// Differential drive from per-side powers.
    fn tank(&mut self, left: f64, right: f64);

    /// Holonomic drive: translation magnitude, direction in degrees
    /// (0 = forward, clockwise positive) and rotation.
    fn mecanum_polar(&mut self, magnitude: f64, direction_deg: f64, rotation: f64);

    /// Zero every motor.
    fn stop_motors(&mut self);
}

/// Chassis pose estimated from wheel travel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

#[inline]
pub fn limit(value: f64) -> f64 {
    value.clamp(-1.0, 1.0)
}

/// Square a power while keeping its sign.
#[inline]
fn square_keep_sign(value: f64) -> f64 {
    value * value.abs()
}

/// Length of the (x, y) translation vector.
#[inline]
pub fn magnitude(x: f64, y: f64) -> f64 {
    x.hypot(y)
}

/// Direction of (x, y) in degrees from +y, clockwise positive.
#[inline]
pub fn direction_degrees(x: f64, y: f64) -> f64 {
    x.atan2(y).to_degrees()
}

/// Arcade mixing: `(left, right)` side powers.
pub fn arcade_mix(forward: f64, rotation: f64, squared: bool) -> (f64, f64) {
    let (mut fwd, mut rot) = (limit(forward), limit(rotation));
    if squared {
        fwd = square_keep_sign(fwd);
        rot = square_keep_sign(rot);
    }

    if fwd > 0.0 {
        if rot > 0.0 {
            (fwd - rot, fwd.max(rot))
        } else {
            (fwd.max(-rot), fwd + rot)
        }
    } else if rot > 0.0 {
        (-(-fwd).max(rot), fwd + rot)
    } else {
        (fwd - rot, -(-fwd).max(-rot))
    }
}

/// Tank mixing: `(left, right)` side powers.
pub fn tank_mix(left: f64, right: f64, squared: bool) -> (f64, f64) {
    let (l, r) = (limit(left), limit(right));
    if squared {
        (square_keep_sign(l), square_keep_sign(r))
    } else {
        (l, r)
    }
}

/// Expand side powers to the four wheels.
#[inline]
pub fn sides_to_wheels(left: f64, right: f64) -> [f64; WHEEL_COUNT] {
    let mut wheels = [0.0; WHEEL_COUNT];
    for wheel in Wheel::ALL {
        wheels[wheel.index()] = if wheel.is_left() { left } else { right };
    }
    wheels
}

/// Mecanum polar mixing, normalised so no wheel exceeds 1.
pub fn mecanum_polar_mix(magnitude: f64, direction_deg: f64, rotation: f64) -> [f64; WHEEL_COUNT] {
    let magnitude = limit(magnitude) * std::f64::consts::SQRT_2;
    let (sin_d, cos_d) = (direction_deg + 45.0).to_radians().sin_cos();

    let mut wheels = [0.0; WHEEL_COUNT];
    wheels[Wheel::LeftFront.index()] = sin_d * magnitude + rotation;
    wheels[Wheel::LeftRear.index()] = cos_d * magnitude + rotation;
    wheels[Wheel::RightFront.index()] = cos_d * magnitude - rotation;
    wheels[Wheel::RightRear.index()] = sin_d * magnitude - rotation;

    let max = wheels.iter().fold(0.0_f64, |m, w| m.max(w.abs()));
    if max > 1.0 {
        for w in &mut wheels {
            *w /= max;
        }
    }
    wheels
}

// ─── Position Estimator ─────────────────────────────────────────────

/// Converts raw encoder readings into a chassis pose relative to the last
/// [`reset`](PositionEstimator::reset).
#[derive(Debug, Clone, PartialEq)]
pub struct PositionEstimator {
    polarity: [f64; WHEEL_COUNT],
    distance_per_unit: f64,
    origin: [f64; WHEEL_COUNT],
}

impl PositionEstimator {
    pub fn new(polarity: [f64; WHEEL_COUNT], distance_per_unit: f64) -> Self {
        Self {
            polarity,
            distance_per_unit,
            origin: [0.0; WHEEL_COUNT],
        }
    }

    /// Take `raw` as the new zero.
    pub fn reset(&mut self, raw: [f64; WHEEL_COUNT]) {
        self.origin = raw;
    }

    /// Signed wheel travel since reset, in encoder units.
    pub fn wheel_travel(&self, raw: [f64; WHEEL_COUNT]) -> [f64; WHEEL_COUNT] {
        let mut travel = [0.0; WHEEL_COUNT];
        for i in 0..WHEEL_COUNT {
            travel[i] = self.polarity[i] * (raw[i] - self.origin[i]);
        }
        travel
    }

    pub fn pose(&self, raw: [f64; WHEEL_COUNT]) -> Pose {
        let t = self.wheel_travel(raw);
        let lf = t[Wheel::LeftFront.index()];
        let lr = t[Wheel::LeftRear.index()];
        let rf = t[Wheel::RightFront.index()];
        let rr = t[Wheel::RightRear.index()];
        let scale = self.distance_per_unit / 4.0;

        Pose {
            x: ((lf + rr) - (rf + lr)) * scale,
            y: (lf + rf + lr + rr) * scale,
            rotation: ((lf + lr) - (rf + rr)) * scale,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
