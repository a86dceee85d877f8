//! Fixed-period robot cycle: mode transitions plus the per-tick phase order
//! pre-periodic → periodic → mode handler → post-periodic.
//!
//! ## Mode Transition
//! 1. Handler `on_mode_stop(old)`.
//! 2. Scheduler stop-mode pass for `old`.
//! 3. Scheduler start-mode pass for `new`.
//! 4. Handler `on_mode_start(new)`.
//!
//! ## Pacing
//! `std::thread::sleep` for the remainder of each period. An overrun is
//! counted and logged but never aborts the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use mecha_common::robot::state::RobotMode;
use tracing::{info, warn};

use crate::task::Scheduler;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    pub sum_cycle_ns: i64,
    /// Cycles whose body ran past the period.
    pub overruns: u64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl std::fmt::Display for CycleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cycle_count == 0 {
            return write!(f, "no cycles");
        }
        write!(
            f,
            "{} cycles, min {} ns, avg {} ns, max {} ns, {} overruns",
            self.cycle_count,
            self.min_cycle_ns,
            self.avg_cycle_ns(),
            self.max_cycle_ns,
            self.overruns
        )
    }
}

// ─── Mode Handler ───────────────────────────────────────────────────

/// Application entry points, called once per mode transition and once per
/// tick between the periodic and post-periodic passes.
pub trait ModeHandler {
    fn on_mode_start(&mut self, mode: RobotMode);
    fn on_mode_periodic(&mut self, mode: RobotMode);
    fn on_mode_stop(&mut self, mode: RobotMode);
}

// ─── Cycle Runner ───────────────────────────────────────────────────

pub struct CycleRunner<H: ModeHandler> {
    scheduler: Scheduler,
    handler: H,
    mode: RobotMode,
    stats: CycleStats,
    period: Duration,
}

impl<H: ModeHandler> CycleRunner<H> {
    /// Runner starting in [`RobotMode::Disabled`].
    pub fn new(scheduler: Scheduler, handler: H, cycle_time_ms: u64) -> Self {
        Self {
            scheduler,
            handler,
            mode: RobotMode::Disabled,
            stats: CycleStats::new(),
            period: Duration::from_millis(cycle_time_ms),
        }
    }

    #[inline]
    pub fn mode(&self) -> RobotMode {
        self.mode
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Switch modes. Switching to the current mode does nothing.
    pub fn set_mode(&mut self, mode: RobotMode) {
        if mode == self.mode {
            return;
        }
        let old = self.mode;
        self.handler.on_mode_stop(old);
        self.scheduler.stop_mode(old);
        self.mode = mode;
        self.scheduler.start_mode(mode);
        self.handler.on_mode_start(mode);
        info!(from = old.name(), to = mode.name(), "mode changed");
    }

    /// Run one tick and record its duration.
    pub fn tick(&mut self) {
        let start = Instant::now();
        let mode = self.mode;

        self.scheduler.pre_periodic(mode);
        self.scheduler.periodic(mode);
        self.handler.on_mode_periodic(mode);
        self.scheduler.post_periodic(mode);

        let elapsed = start.elapsed();
        self.stats.record(elapsed.as_nanos() as i64);
        if elapsed > self.period {
            self.stats.overruns += 1;
            warn!(
                cycle = self.stats.cycle_count,
                elapsed_us = elapsed.as_micros() as u64,
                period_ms = self.period.as_millis() as u64,
                "cycle overrun"
            );
        }
    }

    /// Tick at the configured period until `running` clears or
    /// `max_cycles` ticks have run. The current mode is stopped on exit.
    /// Returns the number of ticks run.
    pub fn run(&mut self, max_cycles: Option<u64>, running: &AtomicBool) -> u64 {
        let mut cycles = 0;
        while running.load(Ordering::SeqCst) && max_cycles.is_none_or(|max| cycles < max) {
            let start = Instant::now();
            self.tick();
            cycles += 1;
            if let Some(remaining) = self.period.checked_sub(start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
        self.set_mode(RobotMode::Disabled);
        cycles
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
