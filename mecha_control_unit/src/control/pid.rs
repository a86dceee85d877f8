//! Single-axis PID controller with clamped output, integral anti-windup and
//! an on-target latch.
//!
//! Zero Ki disables integral; zero Kd disables derivative. Elapsed time is
//! read from the shared clock on each [`PidController::compute_output`], so
//! the controller works with any tick period.

use mecha_common::robot::config::PidConfig;
use tracing::trace;

use crate::event::SharedClock;

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// Feedback controller for one axis.
///
/// The integral accumulator is reset whenever a new target is set or the
/// controller is reset, and the output is always clamped to
/// `[min_output, max_output]`.
pub struct PidController {
    /// Label used in logs and parameter listings.
    name: &'static str,
    gains: PidGains,
    /// Largest absolute error still counted as on target.
    tolerance: f64,
    /// How long the error must stay inside `tolerance` before
    /// [`is_on_target`](Self::is_on_target) reports true.
    settling_ms: u64,
    /// Lower output clamp.
    min_output: f64,
    /// Upper output clamp.
    max_output: f64,
    /// Error is `input - target` instead of `target - input`.
    inverted: bool,
    /// Targets are taken as given instead of relative to the current input.
    absolute_setpoint: bool,

    /// Absolute setpoint being tracked.
    target: f64,
    /// Accumulated `error * dt`, bounded so `ki * integral` stays inside the
    /// output clamp.
    integral: f64,
    /// Error from the previous computation, for the derivative term.
    prev_error: f64,
    /// Clock reading at the previous computation.
    prev_time_ms: u64,
    /// Clamped output of the previous computation.
    last_output: f64,
    /// When the error first entered the tolerance band, if it is inside now.
    on_target_since: Option<u64>,
    clock: SharedClock,
}

impl PidController {
    pub fn new(name: &'static str, config: &PidConfig, clock: SharedClock) -> Self {
        let now = clock.now_ms();
        Self {
            name,
            gains: PidGains::new(config.kp, config.ki, config.kd),
            tolerance: config.tolerance,
            settling_ms: config.settling_ms,
            min_output: config.min_output,
            max_output: config.max_output,
            inverted: config.inverted,
            absolute_setpoint: config.absolute_setpoint,
            target: 0.0,
            integral: 0.0,
            prev_error: 0.0,
            prev_time_ms: now,
            last_output: 0.0,
            on_target_since: None,
            clock,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Replace the gains. Accumulated state is kept.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    /// Change the output clamp. Ignored if `min >= max`.
    pub fn set_output_range(&mut self, min: f64, max: f64) {
        if min < max {
            self.min_output = min;
            self.max_output = max;
        }
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    pub fn last_output(&self) -> f64 {
        self.last_output
    }

    /// Setpoint mode from configuration.
    #[inline]
    pub fn is_absolute_setpoint(&self) -> bool {
        self.absolute_setpoint
    }

    /// Arm a new setpoint: `value` itself when `absolute`, otherwise
    /// `current_input + value`. Clears integral, derivative history and the
    /// on-target latch.
    pub fn set_target(&mut self, value: f64, current_input: f64, absolute: bool) {
        self.target = if absolute {
            value
        } else {
            current_input + value
        };
        self.integral = 0.0;
        self.prev_error = self.error_for(current_input);
        self.prev_time_ms = self.clock.now_ms();
        self.on_target_since = None;
        trace!(pid = self.name, target = self.target, input = current_input, "setpoint armed");
    }

    /// One control step. Returns the clamped output.
    pub fn compute_output(&mut self, current_input: f64) -> f64 {
        let now = self.clock.now_ms();
        let error = self.error_for(current_input);
        let dt = now.saturating_sub(self.prev_time_ms) as f64 / 1000.0;

        // Same-tick re-entry: no time has passed, so neither the integral nor
        // the derivative can advance.
        let d_term = if dt > 0.0 {
            if self.gains.ki != 0.0 {
                let limit = self.min_output.abs().max(self.max_output.abs()) / self.gains.ki.abs();
                self.integral = (self.integral + error * dt).clamp(-limit, limit);
            }
            self.gains.kd * (error - self.prev_error) / dt
        } else {
            0.0
        };

        let raw = self.gains.kp * error + self.gains.ki * self.integral + d_term;
        let output = raw.clamp(self.min_output, self.max_output);

        if error.abs() <= self.tolerance {
            self.on_target_since.get_or_insert(now);
        } else {
            self.on_target_since = None;
        }

        self.prev_error = error;
        self.prev_time_ms = now;
        self.last_output = output;
        trace!(pid = self.name, error, output, "pid step");
        output
    }

    /// True once the error has stayed inside tolerance for the settling
    /// duration without a single excursion.
    pub fn is_on_target(&self) -> bool {
        self.on_target_since
            .is_some_and(|since| self.clock.now_ms().saturating_sub(since) >= self.settling_ms)
    }

    /// Clear integral, derivative history and the on-target latch. Gains and
    /// target are kept.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.prev_time_ms = self.clock.now_ms();
        self.last_output = 0.0;
        self.on_target_since = None;
    }

    #[inline]
    fn error_for(&self, input: f64) -> f64 {
        if self.inverted {
            input - self.target
        } else {
            self.target - input
        }
    }
}

impl std::fmt::Debug for PidController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PidController")
            .field("name", &self.name)
            .field("gains", &self.gains)
            .field("target", &self.target)
            .field("integral", &self.integral)
            .field("on_target_since", &self.on_target_since)
            .finish_non_exhaustive()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
