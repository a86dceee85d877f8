//! Sequential state machine for autonomous routines.
//!
//! States are caller-defined integers starting at [`SM_STATE_STARTED`];
//! [`SM_STATE_DISABLED`] means not running. A routine polls
//! [`StateMachine::is_ready`] each tick, acts on
//! [`StateMachine::current_state`], then arms a wait. The wait is evaluated
//! on the scheduler's pre-periodic pass and never blocks.

use mecha_common::consts::{SM_STATE_DISABLED, SM_STATE_STARTED};
use mecha_common::robot::state::RobotMode;
use tracing::{debug, info};

use crate::event::{Event, SharedClock, deadline_after, deadline_reached};
use crate::task::{Task, TaskPhases};

/// Pending wait: advance to `next_state` once any event is signaled or the
/// deadline passes.
#[derive(Debug, Clone)]
struct WaitDescriptor {
    events: Vec<Event>,
    deadline_ms: Option<u64>,
    next_state: u32,
}

pub struct StateMachine {
    /// Label used in logs.
    name: &'static str,
    /// Current state, [`SM_STATE_DISABLED`] when stopped.
    state: u32,
    /// Set when the routine may act on `state`; cleared while a wait is armed.
    ready: bool,
    /// Armed wait, resolved by [`evaluate`](Self::evaluate).
    wait: Option<WaitDescriptor>,
    /// Source of the time used for wait deadlines.
    clock: SharedClock,
}

impl StateMachine {
    pub const PHASES: TaskPhases = TaskPhases::PRE_PERIODIC;

    pub fn new(name: &'static str, clock: SharedClock) -> Self {
        Self {
            name,
            state: SM_STATE_DISABLED,
            ready: false,
            wait: None,
            clock,
        }
    }

    /// Begin a sequence at [`SM_STATE_STARTED`].
    pub fn start(&mut self) {
        self.state = SM_STATE_STARTED;
        self.ready = true;
        self.wait = None;
        info!(sm = self.name, "state machine started");
    }

    /// End the sequence: state 0, not ready, no pending wait. Safe to call
    /// repeatedly.
    pub fn stop(&mut self) {
        if self.state != SM_STATE_DISABLED {
            info!(sm = self.name, last_state = self.state, "state machine stopped");
        }
        self.state = SM_STATE_DISABLED;
        self.ready = false;
        self.wait = None;
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Meaningful only while [`is_ready`](Self::is_ready).
    #[inline]
    pub fn current_state(&self) -> u32 {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state != SM_STATE_DISABLED
    }

    /// Wait for `event`, or `timeout_ms` when non-zero, then move to
    /// `next_state`.
    pub fn wait_for_single_event(&mut self, event: &Event, next_state: u32, timeout_ms: u64) {
        self.wait_for_events(std::slice::from_ref(event), next_state, timeout_ms);
    }

    /// Wait for any of `events`, or `timeout_ms` when non-zero, then move to
    /// `next_state`.
    ///
    /// Arming clears the awaited events so a signal left over from an
    /// earlier step cannot satisfy this wait. With no events and no timeout
    /// the wait completes on the next pass.
    pub fn wait_for_events(&mut self, events: &[Event], next_state: u32, timeout_ms: u64) {
        if !self.is_running() {
            return;
        }
        for ev in events {
            ev.clear();
        }
        self.wait = Some(WaitDescriptor {
            events: events.to_vec(),
            deadline_ms: deadline_after(self.clock.now_ms(), timeout_ms),
            next_state,
        });
        self.ready = false;
        debug!(
            sm = self.name,
            state = self.state,
            next_state,
            events = events.len(),
            timeout_ms,
            "wait armed"
        );
    }

    /// Evaluate the pending wait; runs in the pre-periodic phase.
    pub fn evaluate(&mut self) {
        let Some(wait) = &self.wait else {
            return;
        };
        let signaled = wait.events.iter().any(Event::is_signaled);
        let expired = deadline_reached(wait.deadline_ms, self.clock.now_ms());
        if signaled || expired || (wait.events.is_empty() && wait.deadline_ms.is_none()) {
            let next = wait.next_state;
            debug!(sm = self.name, from = self.state, to = next, signaled, expired, "state advanced");
            self.state = next;
            self.wait = None;
            self.ready = true;
        }
    }
}

impl Task for StateMachine {
    fn pre_periodic(&mut self, _mode: RobotMode) {
        self.evaluate();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
