//! Cooperative task host.
//!
//! The [`Scheduler`] is owned by the robot root and holds an ordered table
//! of task handles. Every callback runs to completion on the caller's
//! thread; a task that needs to wait returns and is polled again next tick.
//!
//! ## Phase order
//! - `START_MODE` / `STOP_MODE`: once per mode transition.
//! - `PRE_PERIODIC` → `PERIODIC` → `POST_PERIODIC`: every tick.
//!
//! Within a phase, tasks run in registration order.

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;
use mecha_common::consts::MAX_TASKS;
use mecha_common::robot::state::RobotMode;
use tracing::{debug, warn};

use crate::error::SchedulerError;

bitflags! {
    /// Callback phases a task subscribes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TaskPhases: u8 {
        const START_MODE    = 0x01;
        const STOP_MODE     = 0x02;
        const PRE_PERIODIC  = 0x04;
        const PERIODIC      = 0x08;
        const POST_PERIODIC = 0x10;
    }
}

impl TaskPhases {
    /// Phases run once per mode transition.
    pub const MODE_CHANGE: Self = Self::from_bits_truncate(
        Self::START_MODE.bits() | Self::STOP_MODE.bits(),
    );
}

impl Default for TaskPhases {
    fn default() -> Self {
        Self::empty()
    }
}

/// Callbacks of a cooperative task. Unsubscribed phases are never invoked,
/// so a task only implements the ones it registers for.
pub trait Task {
    fn start_mode(&mut self, _mode: RobotMode) {}
    fn stop_mode(&mut self, _mode: RobotMode) {}
    fn pre_periodic(&mut self, _mode: RobotMode) {}
    fn periodic(&mut self, _mode: RobotMode) {}
    fn post_periodic(&mut self, _mode: RobotMode) {}
}

/// Shared handle to a registered task. The subsystem's owner keeps a clone
/// to issue commands between ticks.
pub type TaskHandle = Rc<RefCell<dyn Task>>;

#[derive(Debug, Clone, Copy)]
enum Phase {
    StartMode,
    StopMode,
    PrePeriodic,
    Periodic,
    PostPeriodic,
}

impl Phase {
    const fn mask(self) -> TaskPhases {
        match self {
            Self::StartMode => TaskPhases::START_MODE,
            Self::StopMode => TaskPhases::STOP_MODE,
            Self::PrePeriodic => TaskPhases::PRE_PERIODIC,
            Self::Periodic => TaskPhases::PERIODIC,
            Self::PostPeriodic => TaskPhases::POST_PERIODIC,
        }
    }
}

struct TaskEntry {
    name: String,
    phases: TaskPhases,
    task: TaskHandle,
}

/// Ordered task table driving the per-tick phases.
#[derive(Default)]
pub struct Scheduler {
    tasks: heapless::Vec<TaskEntry, MAX_TASKS>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: heapless::Vec::new(),
        }
    }

    /// Append a task to the table.
    ///
    /// # Errors
    /// `DuplicateTask` if the name is taken, `TaskTableFull` at capacity.
    /// The table is unchanged on error.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        phases: TaskPhases,
        task: TaskHandle,
    ) -> Result<(), SchedulerError> {
        let name = name.into();
        if self.tasks.iter().any(|t| t.name == name) {
            return Err(SchedulerError::DuplicateTask(name));
        }
        if self.tasks.is_full() {
            return Err(SchedulerError::TaskTableFull(MAX_TASKS));
        }
        debug!(task = %name, phases = ?phases, "task registered");
        self.tasks
            .push(TaskEntry { name, phases, task })
            .map_err(|_| SchedulerError::TaskTableFull(MAX_TASKS))
    }

    /// Remove a task. Returns `false` if no task had that name.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.name != name);
        let removed = self.tasks.len() != before;
        if removed {
            debug!(task = %name, "task unregistered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Registered task names in invocation order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }

    pub fn start_mode(&self, mode: RobotMode) {
        self.run_phase(Phase::StartMode, mode);
    }

    pub fn stop_mode(&self, mode: RobotMode) {
        self.run_phase(Phase::StopMode, mode);
    }

    pub fn pre_periodic(&self, mode: RobotMode) {
        self.run_phase(Phase::PrePeriodic, mode);
    }

    pub fn periodic(&self, mode: RobotMode) {
        self.run_phase(Phase::Periodic, mode);
    }

    pub fn post_periodic(&self, mode: RobotMode) {
        self.run_phase(Phase::PostPeriodic, mode);
    }

    fn run_phase(&self, phase: Phase, mode: RobotMode) {
        let mask = phase.mask();
        for entry in self.tasks.iter().filter(|t| t.phases.contains(mask)) {
            // A handle still borrowed here means the owner is holding it across
            // the tick; skip rather than re-enter.
            let Ok(mut task) = entry.task.try_borrow_mut() else {
                warn!(task = %entry.name, phase = ?phase, "task busy, phase skipped");
                continue;
            };
            match phase {
                Phase::StartMode => task.start_mode(mode),
                Phase::StopMode => task.stop_mode(mode),
                Phase::PrePeriodic => task.pre_periodic(mode),
                Phase::Periodic => task.periodic(mode),
                Phase::PostPeriodic => task.post_periodic(mode),
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
